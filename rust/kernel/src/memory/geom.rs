// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry records held by the memory kernel and their evaluators.
//!
//! Analytic parameterizations:
//!
//! | class    | point at `(u, v)` or `t`                                 |
//! |----------|-----------------------------------------------------------|
//! | line     | `p + t d`                                                 |
//! | circle   | `o + r (cos t X + sin t Y)`                               |
//! | plane    | `o + u X + v Y`                                           |
//! | cylinder | `o + r (cos u X + sin u Y) + v A`                         |
//! | cone     | `o + (r + v tan a)(cos u X + sin u Y) + v A`              |
//! | sphere   | `o + r cos v (cos u X + sin u Y) + r sin v A`             |
//! | torus    | `o + (R + r cos v)(cos u X + sin u Y) + r sin v A`        |

use std::f64::consts::{FRAC_PI_2, TAU};

use brep_bridge_geometry::{Extents, NurbsCurve, NurbsSurface};
use nalgebra::{Point3, Vector3};

use crate::sf::*;
use crate::tag::GeometryClass;

/// Coarse samples taken before refining a closest-point search.
const SEARCH_SAMPLES: usize = 64;
const REFINE_ITERATIONS: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum Geom {
    Point(Point3<f64>),
    Line(LineSf),
    Circle(CircleSf),
    Ellipse(EllipseSf),
    BCurve {
        curve: NurbsCurve,
        periodic: bool,
    },
    Plane(PlaneSf),
    Cylinder(CylinderSf),
    Cone(ConeSf),
    Sphere(SphereSf),
    Torus(TorusSf),
    BSurface {
        surface: NurbsSurface,
        /// Periodicity in U and V.
        periodic: (bool, bool),
    },
}

impl Geom {
    pub fn class(&self) -> GeometryClass {
        match self {
            Geom::Point(_) => GeometryClass::Point,
            Geom::Line(_) => GeometryClass::Line,
            Geom::Circle(_) => GeometryClass::Circle,
            Geom::Ellipse(_) => GeometryClass::Ellipse,
            Geom::BCurve { .. } => GeometryClass::BCurve,
            Geom::Plane(_) => GeometryClass::Plane,
            Geom::Cylinder(_) => GeometryClass::Cylinder,
            Geom::Cone(_) => GeometryClass::Cone,
            Geom::Sphere(_) => GeometryClass::Sphere,
            Geom::Torus(_) => GeometryClass::Torus,
            Geom::BSurface { .. } => GeometryClass::BSurface,
        }
    }

    /// Parameter range of a curve; `None` for unbounded or non-curves.
    pub fn curve_interval(&self) -> Option<(f64, f64)> {
        match self {
            Geom::Circle(_) | Geom::Ellipse(_) => Some((0.0, TAU)),
            Geom::BCurve { curve, .. } => Some(curve.domain()),
            _ => None,
        }
    }

    pub fn curve_point(&self, t: f64) -> Option<Point3<f64>> {
        match self {
            Geom::Line(l) => Some(l.position + l.direction * t),
            Geom::Circle(c) => Some(c.basis.point_in_plane(c.radius * t.cos(), c.radius * t.sin())),
            Geom::Ellipse(e) => Some(
                e.basis
                    .point_in_plane(e.major_radius * t.cos(), e.minor_radius * t.sin()),
            ),
            Geom::BCurve { curve, .. } => Some(curve.point_at(t)),
            _ => None,
        }
    }

    /// Distance from `q` to the curve.
    pub fn curve_distance(&self, q: &Point3<f64>) -> Option<f64> {
        match self {
            Geom::Line(l) => {
                let d = q - l.position;
                Some((d - l.direction * d.dot(&l.direction)).norm())
            }
            Geom::Circle(c) => {
                let d = q - c.basis.origin;
                let height = d.dot(&c.basis.axis);
                let radial = (d - c.basis.axis * height).norm();
                Some(((radial - c.radius).powi(2) + height.powi(2)).sqrt())
            }
            Geom::Ellipse(_) | Geom::BCurve { .. } => {
                let range = self.curve_interval()?;
                let t = closest_parameter(|t| self.curve_point(t), range, q)?;
                self.curve_point(t).map(|p| (p - q).norm())
            }
            _ => None,
        }
    }

    /// Parameter box of a surface; `None` for unbounded or non-surfaces.
    pub fn uvbox(&self) -> Option<((f64, f64), (f64, f64))> {
        match self {
            Geom::Sphere(_) => Some(((0.0, TAU), (-FRAC_PI_2, FRAC_PI_2))),
            Geom::Torus(_) => Some(((0.0, TAU), (0.0, TAU))),
            Geom::BSurface { surface, .. } => Some(surface.domain()),
            _ => None,
        }
    }

    pub fn surface_point(&self, u: f64, v: f64) -> Option<Point3<f64>> {
        let (su, cu) = u.sin_cos();
        let p = match self {
            Geom::Plane(p) => p.basis.point_in_plane(u, v),
            Geom::Cylinder(c) => {
                c.basis.point_in_plane(c.radius * cu, c.radius * su) + c.basis.axis * v
            }
            Geom::Cone(c) => {
                let r = c.radius + v * c.semi_angle.tan();
                c.basis.point_in_plane(r * cu, r * su) + c.basis.axis * v
            }
            Geom::Sphere(s) => {
                let (sv, cv) = v.sin_cos();
                s.basis.point_in_plane(s.radius * cv * cu, s.radius * cv * su)
                    + s.basis.axis * (s.radius * sv)
            }
            Geom::Torus(t) => {
                let (sv, cv) = v.sin_cos();
                let ring = t.major_radius + t.minor_radius * cv;
                t.basis.point_in_plane(ring * cu, ring * su) + t.basis.axis * (t.minor_radius * sv)
            }
            Geom::BSurface { surface, .. } => surface.point_at(u, v),
            _ => return None,
        };
        Some(p)
    }

    pub fn surface_normal(&self, u: f64, v: f64) -> Option<Vector3<f64>> {
        let (su, cu) = u.sin_cos();
        match self {
            Geom::Plane(p) => Some(p.basis.axis),
            Geom::Cylinder(c) => Some(c.basis.ref_direction * cu + c.basis.y_direction() * su),
            Geom::Cone(c) => {
                let radial = c.basis.ref_direction * cu + c.basis.y_direction() * su;
                let (sa, ca) = c.semi_angle.sin_cos();
                Some(radial * ca - c.basis.axis * sa)
            }
            Geom::Sphere(s) => {
                let (sv, cv) = v.sin_cos();
                let radial = s.basis.ref_direction * cu + s.basis.y_direction() * su;
                Some(radial * cv + s.basis.axis * sv)
            }
            Geom::Torus(t) => {
                let (sv, cv) = v.sin_cos();
                let radial = t.basis.ref_direction * cu + t.basis.y_direction() * su;
                Some(radial * cv + t.basis.axis * sv)
            }
            Geom::BSurface { surface, .. } => surface.normal_at(u, v),
            _ => None,
        }
    }

    /// Parameters of the surface point closest to `q`.
    pub fn surface_parameter(&self, q: &Point3<f64>) -> Option<(f64, f64)> {
        let angle = |frame: &brep_bridge_geometry::Frame, d: &Vector3<f64>| {
            let a = d.dot(&frame.y_direction()).atan2(d.dot(&frame.ref_direction));
            if a < 0.0 {
                a + TAU
            } else {
                a
            }
        };
        match self {
            Geom::Plane(p) => {
                let d = q - p.basis.origin;
                Some((d.dot(&p.basis.ref_direction), d.dot(&p.basis.y_direction())))
            }
            Geom::Cylinder(c) => {
                let d = q - c.basis.origin;
                Some((angle(&c.basis, &d), d.dot(&c.basis.axis)))
            }
            Geom::Cone(c) => {
                let d = q - c.basis.origin;
                Some((angle(&c.basis, &d), d.dot(&c.basis.axis)))
            }
            Geom::Sphere(s) => {
                let d = q - s.basis.origin;
                let n = d.norm();
                if n <= f64::EPSILON {
                    return Some((0.0, 0.0));
                }
                Some((angle(&s.basis, &d), (d.dot(&s.basis.axis) / n).clamp(-1.0, 1.0).asin()))
            }
            Geom::Torus(t) => {
                let d = q - t.basis.origin;
                let u = angle(&t.basis, &d);
                let radial = t.basis.ref_direction * u.cos() + t.basis.y_direction() * u.sin();
                let w = d - radial * t.major_radius;
                let mut v = w.dot(&t.basis.axis).atan2(w.dot(&radial));
                if v < 0.0 {
                    v += TAU;
                }
                Some((u, v))
            }
            Geom::BSurface { surface, .. } => Some(bsurface_parameter(surface, q)),
            _ => None,
        }
    }

    /// Cartesian points that must stay inside the size box.
    pub fn anchor_points(&self) -> Vec<Point3<f64>> {
        match self {
            Geom::Point(p) => vec![*p],
            Geom::Line(l) => vec![l.position],
            Geom::Circle(c) => vec![c.basis.origin],
            Geom::Ellipse(e) => vec![e.basis.origin],
            Geom::BCurve { curve, .. } => curve.control_points(),
            Geom::Plane(p) => vec![p.basis.origin],
            Geom::Cylinder(c) => vec![c.basis.origin],
            Geom::Cone(c) => vec![c.basis.origin],
            Geom::Sphere(s) => vec![s.basis.origin],
            Geom::Torus(t) => vec![t.basis.origin],
            Geom::BSurface { surface, .. } => surface.control_points(),
        }
    }

    /// Box of a surface that closes on itself without trimming.
    pub fn closed_extent(&self) -> Option<Extents> {
        let (origin, r) = match self {
            Geom::Sphere(s) => (s.basis.origin, s.radius),
            Geom::Torus(t) => (t.basis.origin, t.major_radius + t.minor_radius),
            _ => return None,
        };
        let r = Vector3::repeat(r.abs());
        Some(Extents::new(origin - r, origin + r))
    }

    /// Samples the surface over a parameter box.
    pub fn sample_extent(&self, ((u0, u1), (v0, v1)): ((f64, f64), (f64, f64))) -> Option<Extents> {
        const GRID: usize = 8;
        let mut points = Vec::with_capacity((GRID + 1) * (GRID + 1));
        for i in 0..=GRID {
            let u = u0 + (u1 - u0) * i as f64 / GRID as f64;
            for j in 0..=GRID {
                let v = v0 + (v1 - v0) * j as f64 / GRID as f64;
                points.push(self.surface_point(u, v)?);
            }
        }
        Extents::from_points(&points)
    }
}

/// One-dimensional closest-point search: coarse sampling, then ternary
/// refinement around the best sample.
fn closest_parameter(
    eval: impl Fn(f64) -> Option<Point3<f64>>,
    (a, b): (f64, f64),
    q: &Point3<f64>,
) -> Option<f64> {
    let dist = |t: f64| eval(t).map(|p| (p - q).norm_squared());
    let step = (b - a) / SEARCH_SAMPLES as f64;
    let mut best = (a, dist(a)?);
    for i in 1..=SEARCH_SAMPLES {
        let t = a + step * i as f64;
        let d = dist(t)?;
        if d < best.1 {
            best = (t, d);
        }
    }
    let (mut lo, mut hi) = ((best.0 - step).max(a), (best.0 + step).min(b));
    for _ in 0..REFINE_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if dist(m1)? < dist(m2)? {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    Some(0.5 * (lo + hi))
}

fn bsurface_parameter(s: &NurbsSurface, q: &Point3<f64>) -> (f64, f64) {
    const GRID: usize = 16;
    let ((u0, u1), (v0, v1)) = s.domain();
    let mut best = (u0, v0, f64::INFINITY);
    for i in 0..=GRID {
        let u = u0 + (u1 - u0) * i as f64 / GRID as f64;
        for j in 0..=GRID {
            let v = v0 + (v1 - v0) * j as f64 / GRID as f64;
            let d = (s.point_at(u, v) - q).norm_squared();
            if d < best.2 {
                best = (u, v, d);
            }
        }
    }

    // Gauss-Newton on the tangent plane.
    let (mut u, mut v) = (best.0, best.1);
    for _ in 0..20 {
        let r = s.point_at(u, v) - q;
        let (su, sv) = s.partials(u, v);
        let (a, b, c) = (su.dot(&su), su.dot(&sv), sv.dot(&sv));
        let det = a * c - b * b;
        if det.abs() <= f64::EPSILON {
            break;
        }
        let (gu, gv) = (su.dot(&r), sv.dot(&r));
        let du = (c * gu - b * gv) / det;
        let dv = (a * gv - b * gu) / det;
        u = (u - du).clamp(u0, u1);
        v = (v - dv).clamp(v0, v1);
        if du.abs() + dv.abs() < 1e-12 {
            break;
        }
    }
    (u, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brep_bridge_geometry::Frame;

    fn frame() -> Frame {
        Frame::from_axes(Point3::new(1.0, 2.0, 3.0), Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn torus_parameter_inverts_point() {
        let g = Geom::Torus(TorusSf {
            basis: frame(),
            major_radius: 5.0,
            minor_radius: 1.0,
        });
        let p = g.surface_point(1.2, 2.5).unwrap();
        let (u, v) = g.surface_parameter(&p).unwrap();
        assert_relative_eq!(u, 1.2, epsilon = 1e-9);
        assert_relative_eq!(v, 2.5, epsilon = 1e-9);
    }

    #[test]
    fn sphere_normal_points_out() {
        let g = Geom::Sphere(SphereSf {
            basis: frame(),
            radius: 2.0,
        });
        let p = g.surface_point(0.4, 0.3).unwrap();
        let n = g.surface_normal(0.4, 0.3).unwrap();
        assert_relative_eq!((p - frame().origin).normalize(), n, epsilon = 1e-12);
    }

    #[test]
    fn ellipse_distance_is_refined() {
        let g = Geom::Ellipse(EllipseSf {
            basis: frame(),
            major_radius: 4.0,
            minor_radius: 1.0,
        });
        let on = g.curve_point(0.77).unwrap();
        assert!(g.curve_distance(&on).unwrap() < 1e-9);
    }

    #[test]
    fn cone_normal_is_perpendicular_to_ruling() {
        let g = Geom::Cone(ConeSf {
            basis: frame(),
            radius: 1.0,
            semi_angle: 0.3,
        });
        let ruling = g.surface_point(0.5, 2.0).unwrap() - g.surface_point(0.5, 0.0).unwrap();
        let n = g.surface_normal(0.5, 1.0).unwrap();
        assert_relative_eq!(ruling.dot(&n), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn planes_are_unbounded() {
        let g = Geom::Plane(PlaneSf { basis: frame() });
        assert!(g.uvbox().is_none());
        assert_eq!(g.class(), GeometryClass::Plane);
    }
}
