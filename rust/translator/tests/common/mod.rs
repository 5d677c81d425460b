// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Source body fixtures shared by the integration tests.

#![allow(dead_code)]

use std::f64::consts::TAU;

use brep_bridge_core::{
    BodyKind, BrepGraph, EntityHandle, LoopEdge, LoopType, ShellType, SourceCurve, SourceSurface,
};
use brep_bridge_geometry::{Extents, Frame, KnotVector, NurbsCurve, NurbsSurface};
use nalgebra::{Point3, Vector3};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

fn frame(origin: Point3<f64>, axis: Vector3<f64>, ref_direction: Vector3<f64>) -> Frame {
    Frame::from_axes(origin, axis, ref_direction).unwrap()
}

fn line(g: &mut BrepGraph, a: (EntityHandle, Point3<f64>), b: (EntityHandle, Point3<f64>)) -> EntityHandle {
    let curve = SourceCurve::LineSegment { start: a.1, end: b.1 };
    g.add_edge(a.0, b.0, Some(curve), true).unwrap()
}

/// Adds an axis-aligned box shell: 6 planar faces, 12 edges, 8 vertices.
pub fn add_box(g: &mut BrepGraph, min: Point3<f64>, max: Point3<f64>, kind: ShellType) -> EntityHandle {
    let corner = |i: usize| {
        Point3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        )
    };
    let vertices: Vec<EntityHandle> = (0..8).map(|i| g.add_vertex(corner(i))).collect();

    let mut edges = Vec::new();
    for i in 0..8 {
        for k in 0..3 {
            let j = i | (1 << k);
            if j != i {
                let e = line(g, (vertices[i], corner(i)), (vertices[j], corner(j)));
                edges.push((i, j, e));
            }
        }
    }

    let mut faces = Vec::new();
    for axis in 0..3 {
        for side in 0..2 {
            let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
            let base = side << axis;
            let cycle = [base, base | 1 << a, base | 1 << a | 1 << b, base | 1 << b];
            let uses = (0..4)
                .map(|n| {
                    let (p, q) = (cycle[n], cycle[(n + 1) % 4]);
                    let &(i, _, e) = edges
                        .iter()
                        .find(|(i, j, _)| (*i, *j) == (p, q) || (*i, *j) == (q, p))
                        .unwrap();
                    LoopEdge::new(e, i == p)
                })
                .collect();
            let lp = g.add_loop(LoopType::Exterior, uses).unwrap();

            let mut normal = Vector3::zeros();
            normal[axis] = if side == 0 { -1.0 } else { 1.0 };
            let mut reference = Vector3::zeros();
            reference[a] = 1.0;
            let plane = SourceSurface::Plane {
                frame: frame(corner(cycle[0]), normal, reference),
            };
            faces.push(g.add_face(Some(plane), true, vec![lp]).unwrap());
        }
    }
    g.add_shell(kind, faces).unwrap()
}

pub fn cube(min: f64, max: f64) -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Solid);
    let shell = add_box(
        &mut g,
        Point3::new(min, min, min),
        Point3::new(max, max, max),
        ShellType::Exterior,
    );
    g.add_region(vec![shell]).unwrap();
    g
}

/// 10-unit cube with a 4-unit cavity in its middle.
pub fn cube_with_void() -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Solid);
    let outer = add_box(
        &mut g,
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(10.0, 10.0, 10.0),
        ShellType::Exterior,
    );
    let inner = add_box(
        &mut g,
        Point3::new(3.0, 3.0, 3.0),
        Point3::new(7.0, 7.0, 7.0),
        ShellType::Interior,
    );
    g.add_region(vec![outer, inner]).unwrap();
    g
}

fn square_loop(g: &mut BrepGraph, corners: [Point3<f64>; 4], kind: LoopType, flip_first: bool) -> EntityHandle {
    let vs: Vec<(EntityHandle, Point3<f64>)> = corners.iter().map(|p| (g.add_vertex(*p), *p)).collect();
    let mut uses = Vec::new();
    for i in 0..4 {
        let (a, b) = (vs[i], vs[(i + 1) % 4]);
        let edge = if i == 0 && flip_first {
            // Curve runs v2→v1 while the edge claims it follows the curve.
            let curve = SourceCurve::LineSegment { start: b.1, end: a.1 };
            g.add_edge(a.0, b.0, Some(curve), true).unwrap()
        } else {
            line(g, a, b)
        };
        uses.push(LoopEdge::new(edge, true));
    }
    g.add_loop(kind, uses).unwrap()
}

/// Planar `width` x `height` sheet in the XY plane with a corner at the
/// origin, optionally with a rectangular hole.
pub fn rectangle_sheet(width: f64, height: f64, hole: bool, flip_first: bool) -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Surface);
    let p = |x: f64, y: f64| Point3::new(x, y, 0.0);
    let mut loops = vec![square_loop(
        &mut g,
        [p(0.0, 0.0), p(width, 0.0), p(width, height), p(0.0, height)],
        LoopType::Exterior,
        flip_first,
    )];
    if hole {
        let (x0, y0, x1, y1) = (width * 0.25, height * 0.25, width * 0.75, height * 0.75);
        loops.push(square_loop(
            &mut g,
            [p(x0, y0), p(x0, y1), p(x1, y1), p(x1, y0)],
            LoopType::Interior,
            false,
        ));
    }
    let plane = SourceSurface::Plane {
        frame: frame(Point3::origin(), Vector3::z(), Vector3::x()),
    };
    let face = g.add_face(Some(plane), true, loops).unwrap();
    let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}

/// Full sphere: one face with no loops.
pub fn sphere_solid(radius: f64, outer_normal: bool) -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Solid);
    let sphere = SourceSurface::Sphere {
        frame: frame(Point3::origin(), Vector3::z(), Vector3::x()),
        radius,
        outer_normal,
    };
    let face = g.add_bounded_face(Some(sphere), true);
    let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}

/// Solid cone standing on the XY plane: a lateral face whose apex loop is a
/// single point, and a base disk sharing the base circle edge.
pub fn cone_solid() -> BrepGraph {
    let (radius, height) = (2.0, 3.0);
    let mut g = BrepGraph::new(BodyKind::Solid);
    g.set_extents(Extents::new(
        Point3::new(-radius, -radius, 0.0),
        Point3::new(radius, radius, height),
    ));

    let seam = g.add_vertex(Point3::new(radius, 0.0, 0.0));
    let circle = SourceCurve::CircularArc {
        frame: frame(Point3::origin(), Vector3::z(), Vector3::x()),
        radius,
        start_angle: 0.0,
        end_angle: TAU,
    };
    let rim = g.add_edge(seam, seam, Some(circle), true).unwrap();

    let base_loop = g.add_loop(LoopType::Exterior, vec![LoopEdge::new(rim, true)]).unwrap();
    let apex_loop = g.add_singular_loop(LoopType::Unclassified);
    let cone = SourceSurface::Cone {
        base_center: Point3::origin(),
        apex: Point3::new(0.0, 0.0, height),
        axis_of_symmetry: Vector3::z(),
        ref_axis: Vector3::x(),
        base_radius: radius,
        half_angle: (radius / height).atan(),
        outer_normal: true,
    };
    let lateral = g.add_face(Some(cone), true, vec![base_loop, apex_loop]).unwrap();

    let disk_loop = g.add_loop(LoopType::Exterior, vec![LoopEdge::new(rim, false)]).unwrap();
    let plane = SourceSurface::Plane {
        frame: frame(Point3::origin(), -Vector3::z(), Vector3::x()),
    };
    let disk = g.add_face(Some(plane), true, vec![disk_loop]).unwrap();

    let shell = g.add_shell(ShellType::Exterior, vec![lateral, disk]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}

/// Quadratic 3x3 patch over a 4 x 3 rectangle with its middle raised;
/// the boundary stays straight.
pub fn bspline_sheet(normal_reversed: bool) -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Surface);
    let net = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(0.0, 1.5, 0.0),
        Point3::new(2.0, 1.5, 1.0),
        Point3::new(4.0, 1.5, 0.0),
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(2.0, 3.0, 0.0),
        Point3::new(4.0, 3.0, 0.0),
    ];
    let knots = KnotVector::clamped_uniform(3, 2).unwrap();
    let surface = NurbsSurface::new(2, 2, 3, 3, net, None, knots.clone(), knots).unwrap();

    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(4.0, 3.0, 0.0),
        Point3::new(0.0, 3.0, 0.0),
    ];
    let lp = square_loop(&mut g, corners, LoopType::Exterior, false);
    let face = g
        .add_face(
            Some(SourceSurface::Nurbs {
                surface,
                normal_reversed,
                periodic: (false, false),
            }),
            true,
            vec![lp],
        )
        .unwrap();
    let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}

/// Planar sheet bounded by one closed cubic B-spline the source reports as
/// non-periodic.
pub fn closed_spline_sheet() -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Surface);
    g.set_extents(Extents::new(Point3::new(-3.0, 0.0, 0.0), Point3::new(3.0, 3.0, 0.0)));
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 4.0, 0.0),
        Point3::new(-4.0, 4.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
    ];
    let knots = KnotVector::clamped_uniform(4, 3).unwrap();
    let curve = NurbsCurve::new(3, points, None, knots).unwrap();

    let v = g.add_vertex(Point3::origin());
    let edge = g
        .add_edge(
            v,
            v,
            Some(SourceCurve::Nurbs {
                curve,
                periodic: false,
            }),
            true,
        )
        .unwrap();
    let lp = g.add_loop(LoopType::Exterior, vec![LoopEdge::new(edge, true)]).unwrap();
    let plane = SourceSurface::Plane {
        frame: frame(Point3::origin(), Vector3::z(), Vector3::x()),
    };
    let face = g.add_face(Some(plane), true, vec![lp]).unwrap();
    let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}

fn full_circle(frame: Frame, radius: f64) -> SourceCurve {
    SourceCurve::CircularArc {
        frame,
        radius,
        start_angle: 0.0,
        end_angle: TAU,
    }
}

/// Planar disk in the XY plane bounded by one full circle whose only vertex
/// sits at `(radius, 0, 0)`. Extents come from the geometry.
pub fn disk_sheet(radius: f64) -> BrepGraph {
    let mut g = BrepGraph::new(BodyKind::Surface);
    let xy = frame(Point3::origin(), Vector3::z(), Vector3::x());
    let v = g.add_vertex(Point3::new(radius, 0.0, 0.0));
    let rim = g.add_edge(v, v, Some(full_circle(xy, radius)), true).unwrap();
    let lp = g.add_loop(LoopType::Exterior, vec![LoopEdge::new(rim, true)]).unwrap();
    let face = g.add_face(Some(SourceSurface::Plane { frame: xy }), true, vec![lp]).unwrap();
    let shell = g.add_shell(ShellType::Exterior, vec![face]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}

/// Flat solid cylinder of radius 100 and height 1 standing on the XY plane.
/// Its vertices span only a unit segment, so the extents depend on the
/// circles.
pub fn wide_drum() -> BrepGraph {
    let (radius, height) = (100.0, 1.0);
    let mut g = BrepGraph::new(BodyKind::Solid);
    let bottom = frame(Point3::origin(), Vector3::z(), Vector3::x());
    let top = frame(Point3::new(0.0, 0.0, height), Vector3::z(), Vector3::x());

    let v0 = g.add_vertex(Point3::new(radius, 0.0, 0.0));
    let v1 = g.add_vertex(Point3::new(radius, 0.0, height));
    let e0 = g.add_edge(v0, v0, Some(full_circle(bottom, radius)), true).unwrap();
    let e1 = g.add_edge(v1, v1, Some(full_circle(top, radius)), true).unwrap();

    let side_loops = vec![
        g.add_loop(LoopType::Winding, vec![LoopEdge::new(e0, true)]).unwrap(),
        g.add_loop(LoopType::Winding, vec![LoopEdge::new(e1, false)]).unwrap(),
    ];
    let cylinder = SourceSurface::Cylinder {
        frame: bottom,
        radius,
        outer_normal: true,
    };
    let side = g.add_face(Some(cylinder), true, side_loops).unwrap();

    let floor_loop = g.add_loop(LoopType::Exterior, vec![LoopEdge::new(e0, false)]).unwrap();
    let floor = SourceSurface::Plane {
        frame: frame(Point3::origin(), -Vector3::z(), Vector3::x()),
    };
    let floor = g.add_face(Some(floor), true, vec![floor_loop]).unwrap();

    let lid_loop = g.add_loop(LoopType::Exterior, vec![LoopEdge::new(e1, true)]).unwrap();
    let lid = g.add_face(Some(SourceSurface::Plane { frame: top }), true, vec![lid_loop]).unwrap();

    let shell = g.add_shell(ShellType::Exterior, vec![side, floor, lid]).unwrap();
    g.add_region(vec![shell]).unwrap();
    g
}
