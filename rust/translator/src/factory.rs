// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry factory: source curves, surfaces and points to kernel geometry.
//!
//! Every coordinate passes through the body's [`Normalization`] on the way
//! in. Each constructor returns a [`Construction`] inside a `Result`:
//!
//! - `Ok(Created(tag))`: geometry exists in the kernel and is tracked for
//!   cleanup
//! - `Ok(Degraded(reason))`: nothing was created but the caller may carry on
//!   with weaker topology
//! - `Err(_)`: the conversion cannot continue
//!
//! Free-form geometry that the kernel reports as not G1 continuous is
//! refitted once and the unfitted curve discarded.

use std::borrow::Cow;
use std::f64::consts::{FRAC_PI_2, PI};

use brep_bridge_core::{SourceCurve, SourceSurface};
use brep_bridge_geometry::{
    Frame, Normalization, NurbsCurve, NurbsSurface, C1_RELATIVE_TOLERANCE, G1_ANGLE_TOLERANCE,
};
use brep_bridge_kernel::sf::*;
use brep_bridge_kernel::{EntityTag, TargetKernel};
use nalgebra::{Point3, Vector3};

use crate::config::TranslatorConfig;
use crate::error::{Error, Result};

/// Gap below which a curve returns to its start.
const CLOSURE_TOLERANCE: f64 = 1e-8;

/// Torus radii are left alone for scales this close to one.
const TORUS_SCALE_TOLERANCE: f64 = 1e-3;

/// Shortest direction treated as an axis.
const AXIS_TOLERANCE: f64 = 1e-12;

/// Outcome of one geometry constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum Construction {
    Created(EntityTag),
    /// Nothing was created; the topology goes on without this geometry.
    Degraded(String),
}

impl Construction {
    pub fn tag(&self) -> Option<EntityTag> {
        match self {
            Construction::Created(tag) => Some(*tag),
            Construction::Degraded(_) => None,
        }
    }
}

/// How an edge sits on its curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEnds {
    /// Position of vertex 1.
    pub start: Point3<f64>,
    /// Position of vertex 2.
    pub end: Point3<f64>,
    /// Whether vertex1→vertex2 follows the curve's parameterization.
    pub orient_to_curve: bool,
}

/// Builds kernel geometry and remembers every tag it leaves alive.
pub struct GeometryFactory<'a, K> {
    kernel: &'a mut K,
    norm: Normalization,
    config: &'a TranslatorConfig,
    created: Vec<EntityTag>,
}

impl<'a, K: TargetKernel> GeometryFactory<'a, K> {
    pub fn new(kernel: &'a mut K, norm: Normalization, config: &'a TranslatorConfig) -> Self {
        Self {
            kernel,
            norm,
            config,
            created: Vec::new(),
        }
    }

    /// Live geometry created so far, in creation order.
    pub fn created(&self) -> &[EntityTag] {
        &self.created
    }

    pub fn into_created(self) -> Vec<EntityTag> {
        self.created
    }

    pub fn normalization(&self) -> &Normalization {
        &self.norm
    }

    fn register(&mut self, tag: EntityTag) -> EntityTag {
        self.created.push(tag);
        tag
    }

    /// Deletes a superseded entity and stops tracking it.
    fn discard(&mut self, tag: EntityTag) -> Result<()> {
        self.kernel.delete(&[tag])?;
        self.created.retain(|t| *t != tag);
        Ok(())
    }

    fn frame(&self, frame: &Frame) -> Frame {
        frame.transformed(&self.norm.to_kernel)
    }

    // Points

    pub fn point(&mut self, p: &Point3<f64>) -> Result<Construction> {
        let tag = self.kernel.create_point(&PointSf {
            position: self.norm.point(p),
        })?;
        Ok(Construction::Created(self.register(tag)))
    }

    /// Point standing in for a loop that collapses to a single vertex.
    ///
    /// Failure here only degrades the loop, so kernel errors come back as
    /// [`Construction::Degraded`].
    pub fn singular_point(&mut self, surface: &SourceSurface) -> Result<Construction> {
        let Some(p) = surface.representative_point() else {
            return Ok(Construction::Degraded(format!(
                "{} has no representative point",
                surface.kind_name()
            )));
        };
        match self.kernel.create_point(&PointSf {
            position: self.norm.point(&p),
        }) {
            Ok(tag) => Ok(Construction::Created(self.register(tag))),
            Err(e) => Ok(Construction::Degraded(e.to_string())),
        }
    }

    // Curves

    pub fn curve(&mut self, curve: &SourceCurve, ends: EdgeEnds) -> Result<Construction> {
        let curve = orient_to_edge(curve, &ends);
        let tag = match curve.as_ref() {
            SourceCurve::LineSegment { start, end } => {
                let direction = end - start;
                if direction.norm() <= CLOSURE_TOLERANCE {
                    return Err(Error::DegenerateGeometry("zero-length line".into()));
                }
                let tag = self.kernel.create_line(&LineSf {
                    position: self.norm.point(start),
                    direction,
                })?;
                self.register(tag)
            }
            SourceCurve::CircularArc { frame, radius, .. } => {
                let sf = CircleSf {
                    basis: self.frame(frame),
                    radius: self.norm.length(*radius),
                };
                let tag = self.kernel.create_circle(&sf)?;
                self.register(tag)
            }
            SourceCurve::EllipticalArc {
                frame,
                major_radius,
                minor_radius,
                ..
            } => {
                let mut basis = self.frame(frame);
                let (mut major, mut minor) = (*major_radius, *minor_radius);
                if minor > major {
                    // Turn the frame so the longer axis is the reference.
                    basis.ref_direction = basis.y_direction();
                    std::mem::swap(&mut major, &mut minor);
                }
                let tag = self.kernel.create_ellipse(&EllipseSf {
                    basis,
                    major_radius: self.norm.length(major),
                    minor_radius: self.norm.length(minor),
                })?;
                self.register(tag)
            }
            SourceCurve::Nurbs { curve, periodic } => self.nurbs_curve(curve, *periodic)?,
            SourceCurve::Composite(parts) => self.piecewise_curve(parts)?,
            SourceCurve::Unsupported(kind) => {
                return Err(Error::UnsupportedGeometry(format!("curve kind {kind}")))
            }
        };
        Ok(Construction::Created(tag))
    }

    fn nurbs_curve(&mut self, curve: &NurbsCurve, periodic: bool) -> Result<EntityTag> {
        if curve.is_rational() {
            let g1 = curve.g1_discontinuities(G1_ANGLE_TOLERANCE);
            let c1 = curve.c1_discontinuities(C1_RELATIVE_TOLERANCE);
            if !g1.is_empty() || !c1.is_empty() {
                return Err(Error::UnsupportedGeometry(format!(
                    "rational curve with {} G1 and {} C1 discontinuities",
                    g1.len(),
                    c1.len()
                )));
            }
        }

        let curve = curve.transformed(&self.norm.to_kernel);
        let closed = curve.is_closed(CLOSURE_TOLERANCE);
        if closed != periodic {
            tracing::debug!(closed, periodic, "curve periodicity follows closure");
        }
        let sf = BCurveSf::from_nurbs(&curve, closed, closed);
        let tag = self.kernel.create_bcurve(&sf)?;
        self.register(tag);
        self.smooth_curve(tag)
    }

    /// Only all-linear chains are supported.
    fn piecewise_curve(&mut self, parts: &[SourceCurve]) -> Result<EntityTag> {
        let degree = parts.iter().map(segment_degree).max().unwrap_or(0);
        if degree != 1 {
            return Err(Error::UnsupportedGeometry(format!(
                "piecewise curve of degree {degree}"
            )));
        }
        let mut coefficients = Vec::new();
        linear_coefficients(parts, &self.norm, &mut coefficients)?;
        let tag = self.kernel.create_piecewise_bcurve(&PiecewiseSf {
            degree: 1,
            coefficients,
        })?;
        self.register(tag);
        self.smooth_curve(tag)
    }

    fn smooth_curve(&mut self, tag: EntityTag) -> Result<EntityTag> {
        let breaks = self.kernel.find_curve_discontinuities(tag)?;
        if breaks.is_empty() {
            return Ok(tag);
        }
        let interval = self.kernel.curve_interval(tag)?;
        let fitted = self.kernel.fit_curve(tag, interval)?;
        self.register(fitted);
        self.discard(tag)?;
        tracing::debug!(breaks = breaks.len(), "curve refitted for G1 continuity");
        Ok(fitted)
    }

    // Surfaces

    /// Creates the surface of a face.
    ///
    /// Returns the construction and the face→surface bit, flipped when the
    /// source surface's normal points inward or a free-form surface came out
    /// facing the other way.
    pub fn surface(&mut self, surface: &SourceSurface, oriented: bool) -> Result<(Construction, bool)> {
        let (tag, outward) = match surface {
            SourceSurface::Plane { frame } => {
                let basis = self.frame(frame);
                (self.kernel.create_plane(&PlaneSf { basis })?, true)
            }
            SourceSurface::Cylinder {
                frame,
                radius,
                outer_normal,
            } => {
                let sf = CylinderSf {
                    basis: self.frame(frame),
                    radius: self.norm.length(*radius),
                };
                (self.kernel.create_cylinder(&sf)?, *outer_normal)
            }
            SourceSurface::Cone {
                base_center,
                apex,
                axis_of_symmetry,
                ref_axis,
                base_radius,
                half_angle,
                outer_normal,
            } => {
                let mut axis = base_center - apex;
                if axis.norm() <= AXIS_TOLERANCE {
                    axis = *axis_of_symmetry;
                }
                let basis = Frame::from_axes(self.norm.point(base_center), axis, *ref_axis)?
                    .orthogonalized();
                let sf = ConeSf {
                    basis,
                    radius: self.norm.length(*base_radius),
                    semi_angle: *half_angle,
                };
                (self.kernel.create_cone(&sf)?, *outer_normal)
            }
            SourceSurface::Sphere {
                frame,
                radius,
                outer_normal,
            } => {
                let sf = SphereSf {
                    basis: self.frame(frame),
                    radius: self.norm.length(*radius),
                };
                (self.kernel.create_sphere(&sf)?, *outer_normal)
            }
            SourceSurface::Torus {
                frame,
                major_radius,
                minor_radius,
                outer_normal,
            } => (
                self.torus(frame, *major_radius, *minor_radius)?,
                *outer_normal,
            ),
            SourceSurface::EllipticalCone { outer_normal, .. } => {
                (self.elliptical_cone(surface)?, *outer_normal)
            }
            SourceSurface::EllipticalCylinder { outer_normal, .. } => {
                (self.elliptical_cylinder(surface)?, *outer_normal)
            }
            SourceSurface::Nurbs {
                surface: nurbs,
                periodic,
                ..
            } => {
                let (tag, oriented) = self.nurbs_surface(surface, nurbs, *periodic, oriented)?;
                return Ok((Construction::Created(tag), oriented));
            }
            SourceSurface::Unsupported(kind) => {
                return Err(Error::UnsupportedGeometry(format!("surface kind {kind}")))
            }
        };
        self.register(tag);
        if outward {
            Ok((Construction::Created(tag), oriented))
        } else {
            tracing::debug!(kind = surface.kind_name(), "face orientation flipped for inward normal");
            Ok((Construction::Created(tag), !oriented))
        }
    }

    fn torus(&mut self, frame: &Frame, major: f64, minor: f64) -> Result<EntityTag> {
        let scale = self.norm.to_kernel.scale;
        let (major_radius, minor_radius) = if (scale - 1.0).abs() > TORUS_SCALE_TOLERANCE {
            (major * scale, minor * scale)
        } else {
            (major, minor)
        };
        let mut sf = TorusSf {
            basis: self.frame(frame),
            major_radius,
            minor_radius,
        };
        match self.kernel.create_torus(&sf) {
            Err(brep_bridge_kernel::Error::VectorsNotOrthogonal) => {
                tracing::debug!("torus axes re-orthogonalized");
                sf.basis = sf.basis.orthogonalized();
                Ok(self.kernel.create_torus(&sf)?)
            }
            other => Ok(other?),
        }
    }

    /// Circular cone through the major points of an elliptical one.
    fn elliptical_cone(&mut self, surface: &SourceSurface) -> Result<EntityTag> {
        let base = EllipseSample::take(surface, 0.0)?;
        let apex = sample(surface, 1.0, 0.0)?;
        let axis = base.center - apex;
        let height = axis.norm();
        if height <= AXIS_TOLERANCE {
            return Err(Error::DegenerateGeometry("elliptical cone has no height".into()));
        }
        self.log_approximation(surface, &base);
        let basis = Frame::from_axes(self.norm.point(&base.center), axis, base.major_direction)?
            .orthogonalized();
        let sf = ConeSf {
            basis,
            radius: self.norm.length(base.major),
            semi_angle: (base.major / height).atan(),
        };
        Ok(self.kernel.create_cone(&sf)?)
    }

    fn elliptical_cylinder(&mut self, surface: &SourceSurface) -> Result<EntityTag> {
        let base = EllipseSample::take(surface, 0.0)?;
        let axis = sample(surface, 1.0, 0.0)? - sample(surface, 0.0, 0.0)?;
        if axis.norm() <= AXIS_TOLERANCE {
            return Err(Error::DegenerateGeometry("elliptical cylinder has no axis".into()));
        }
        self.log_approximation(surface, &base);
        let basis = Frame::from_axes(self.norm.point(&base.center), axis, base.major_direction)?
            .orthogonalized();
        let sf = CylinderSf {
            basis,
            radius: self.norm.length(base.major),
        };
        Ok(self.kernel.create_cylinder(&sf)?)
    }

    fn log_approximation(&self, surface: &SourceSurface, e: &EllipseSample) {
        if (e.major - e.minor).abs() > self.config.ellipse_tolerance {
            tracing::warn!(
                kind = surface.kind_name(),
                major = e.major,
                minor = e.minor,
                "elliptical surface approximated by its circular analog"
            );
        }
    }

    /// Periodicity is kept only in directions where the surface closes.
    fn nurbs_surface(
        &mut self,
        source: &SourceSurface,
        surface: &NurbsSurface,
        periodic: (bool, bool),
        oriented: bool,
    ) -> Result<(EntityTag, bool)> {
        let moved = surface.transformed(&self.norm.to_kernel);
        let closed = (
            moved.is_closed_in_u(CLOSURE_TOLERANCE),
            moved.is_closed_in_v(CLOSURE_TOLERANCE),
        );
        let kept = (periodic.0 && closed.0, periodic.1 && closed.1);
        if kept != periodic {
            tracing::debug!(?periodic, ?closed, "open surface direction made non-periodic");
        }
        let sf = BSurfaceSf::from_nurbs(&moved, kept, closed);
        let tag = self.kernel.create_bsurface(&sf)?;
        self.register(tag);
        let tag = self.smooth_surface(tag)?;
        let oriented = self.match_normal(source, surface, tag, oriented)?;
        Ok((tag, oriented))
    }

    fn smooth_surface(&mut self, tag: EntityTag) -> Result<EntityTag> {
        let (u_breaks, v_breaks) = self.kernel.find_surface_discontinuities(tag)?;
        if u_breaks.is_empty() && v_breaks.is_empty() {
            return Ok(tag);
        }
        let uvbox = self.kernel.surface_uvbox(tag)?;
        let fitted = self.kernel.fit_surface(tag, uvbox)?;
        self.register(fitted);
        self.discard(tag)?;
        tracing::debug!(
            u_breaks = u_breaks.len(),
            v_breaks = v_breaks.len(),
            "surface refitted for G1 continuity"
        );
        Ok(fitted)
    }

    /// Compares source and kernel normals at the lower parameter corner.
    fn match_normal(
        &self,
        source: &SourceSurface,
        surface: &NurbsSurface,
        tag: EntityTag,
        oriented: bool,
    ) -> Result<bool> {
        let ((u0, _), (v0, _)) = surface.domain();
        let Some(expected) = source.nurbs_normal_at(u0, v0) else {
            return Ok(oriented);
        };
        let ((ku, _), (kv, _)) = self.kernel.surface_uvbox(tag)?;
        let Ok(actual) = self.kernel.surface_normal(tag, ku, kv) else {
            tracing::debug!("no kernel normal at the lower corner, orientation kept");
            return Ok(oriented);
        };
        let cosine = expected.dot(&actual) / actual.norm();
        if cosine < self.config.normal_flip_cosine {
            tracing::debug!(cosine, "face orientation flipped to match surface normal");
            Ok(!oriented)
        } else {
            Ok(oriented)
        }
    }
}

/// Reverses a curve whose direction disagrees with its edge.
///
/// A closed curve is reversed whenever the edge claims to run against it;
/// an open curve when its chord and the vertex1→vertex2 direction disagree
/// with what the edge claims.
fn orient_to_edge<'c>(curve: &'c SourceCurve, ends: &EdgeEnds) -> Cow<'c, SourceCurve> {
    if curve.is_closed(CLOSURE_TOLERANCE) {
        if ends.orient_to_curve {
            return Cow::Borrowed(curve);
        }
        tracing::debug!(kind = curve.kind_name(), "closed edge curve reversed");
        return Cow::Owned(curve.reversed());
    }
    let (Some(start), Some(end)) = (curve.start_point(), curve.end_point()) else {
        return Cow::Borrowed(curve);
    };
    let agrees = (end - start).dot(&(ends.end - ends.start)) > 0.0;
    if agrees == ends.orient_to_curve {
        Cow::Borrowed(curve)
    } else {
        tracing::debug!(
            kind = curve.kind_name(),
            claimed = ends.orient_to_curve,
            "edge curve reversed to match its vertices"
        );
        Cow::Owned(curve.reversed())
    }
}

/// Lowest polynomial degree that represents a segment.
fn segment_degree(curve: &SourceCurve) -> usize {
    match curve {
        SourceCurve::LineSegment { .. } => 1,
        SourceCurve::CircularArc { .. } | SourceCurve::EllipticalArc { .. } => 2,
        SourceCurve::Nurbs { curve, .. } => curve.degree(),
        SourceCurve::Composite(parts) => parts.iter().map(segment_degree).max().unwrap_or(0),
        SourceCurve::Unsupported(_) => usize::MAX,
    }
}

/// Flattens linear segments into start/end coefficient pairs.
fn linear_coefficients(
    parts: &[SourceCurve],
    norm: &Normalization,
    out: &mut Vec<Point3<f64>>,
) -> Result<()> {
    for part in parts {
        match part {
            SourceCurve::LineSegment { start, end } => {
                out.push(norm.point(start));
                out.push(norm.point(end));
            }
            SourceCurve::Nurbs { curve, .. } if curve.degree() == 1 => {
                for pair in curve.control_points().windows(2) {
                    out.push(norm.point(&pair[0]));
                    out.push(norm.point(&pair[1]));
                }
            }
            SourceCurve::Composite(inner) => linear_coefficients(inner, norm, out)?,
            other => {
                return Err(Error::UnsupportedGeometry(format!(
                    "{} in a linear piecewise curve",
                    other.kind_name()
                )))
            }
        }
    }
    Ok(())
}

fn sample(surface: &SourceSurface, u: f64, v: f64) -> Result<Point3<f64>> {
    surface.point_at(u, v).ok_or_else(|| {
        Error::UnsupportedGeometry(format!("{} cannot be evaluated", surface.kind_name()))
    })
}

/// Center and axes of the elliptical section at parameter `u`.
struct EllipseSample {
    center: Point3<f64>,
    major_direction: Vector3<f64>,
    major: f64,
    minor: f64,
}

impl EllipseSample {
    fn take(surface: &SourceSurface, u: f64) -> Result<Self> {
        let p0 = sample(surface, u, 0.0)?;
        let p1 = sample(surface, u, FRAC_PI_2)?;
        let p2 = sample(surface, u, PI)?;
        let center = nalgebra::center(&p0, &p2);
        let major_direction = p0 - center;
        Ok(Self {
            center,
            major: major_direction.norm(),
            minor: (p1 - center).norm(),
            major_direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use brep_bridge_geometry::{normalize, Extents, KnotVector, NormalizerSettings};
    use brep_bridge_kernel::{Geom, GeometryClass, MemoryKernel};

    fn identity() -> Normalization {
        let e = Extents::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
        normalize(&e, &NormalizerSettings::default()).unwrap()
    }

    fn xy() -> Frame {
        Frame::from_axes(Point3::origin(), Vector3::z(), Vector3::x()).unwrap()
    }

    fn along_x(orient_to_curve: bool) -> EdgeEnds {
        EdgeEnds {
            start: Point3::origin(),
            end: Point3::new(10.0, 0.0, 0.0),
            orient_to_curve,
        }
    }

    fn polyline(points: Vec<Point3<f64>>) -> NurbsCurve {
        let knots = KnotVector::clamped_uniform(points.len(), 1).unwrap();
        NurbsCurve::new(1, points, None, knots).unwrap()
    }

    #[test]
    fn backwards_line_is_reversed() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let line = SourceCurve::LineSegment {
            start: Point3::new(10.0, 0.0, 0.0),
            end: Point3::origin(),
        };
        let tag = f.curve(&line, along_x(true)).unwrap().tag().unwrap();
        let Geom::Line(sf) = kernel.geometry(tag).unwrap() else {
            panic!("expected a line");
        };
        assert_relative_eq!(sf.position, Point3::origin());
        assert_relative_eq!(sf.direction, Vector3::x());
    }

    #[test]
    fn consistent_line_is_kept() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let line = SourceCurve::LineSegment {
            start: Point3::new(10.0, 0.0, 0.0),
            end: Point3::origin(),
        };
        let tag = f.curve(&line, along_x(false)).unwrap().tag().unwrap();
        let Geom::Line(sf) = kernel.geometry(tag).unwrap() else {
            panic!("expected a line");
        };
        assert_relative_eq!(sf.position, Point3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn closed_curve_is_created_periodic() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        // A smooth closed quadratic: the ends meet but no corner is left
        // at the seam that the refit would have to remove.
        let knots = KnotVector::new(vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0]).unwrap();
        let curve = NurbsCurve::new(
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
            None,
            knots,
        )
        .unwrap();
        let source = SourceCurve::Nurbs {
            curve,
            periodic: false,
        };
        let ends = EdgeEnds {
            start: Point3::origin(),
            end: Point3::origin(),
            orient_to_curve: true,
        };
        let tag = f.curve(&source, ends).unwrap().tag().unwrap();
        let Geom::BCurve { periodic, .. } = kernel.geometry(tag).unwrap() else {
            panic!("expected a b-curve");
        };
        assert!(*periodic);
    }

    #[test]
    fn backwards_spline_is_reversed() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        // Runs (10,0,0) → origin while the edge says it follows the curve.
        let curve = NurbsCurve::new(
            2,
            vec![
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(5.0, 2.0, 0.0),
                Point3::origin(),
            ],
            None,
            KnotVector::clamped_uniform(3, 2).unwrap(),
        )
        .unwrap();
        let source = SourceCurve::Nurbs {
            curve,
            periodic: false,
        };
        let tag = f.curve(&source, along_x(true)).unwrap().tag().unwrap();
        let Geom::BCurve { curve, periodic } = kernel.geometry(tag).unwrap() else {
            panic!("expected a b-curve");
        };
        assert!(!*periodic);
        assert_relative_eq!(curve.start_point(), Point3::origin(), epsilon = 1e-12);
        assert_relative_eq!(curve.end_point(), Point3::new(10.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn closed_spline_against_its_edge_is_reversed() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let loop_points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let curve = NurbsCurve::new(
            2,
            loop_points,
            None,
            KnotVector::clamped_uniform(4, 2).unwrap(),
        )
        .unwrap();
        let source = SourceCurve::Nurbs {
            curve,
            periodic: true,
        };
        let ends = EdgeEnds {
            start: Point3::origin(),
            end: Point3::origin(),
            orient_to_curve: false,
        };
        let tag = f.curve(&source, ends).unwrap().tag().unwrap();
        let Geom::BCurve { curve, periodic } = kernel.geometry(tag).unwrap() else {
            panic!("expected a b-curve");
        };
        assert!(*periodic);
        let poles = curve.control_points();
        assert_relative_eq!(poles[1], Point3::new(2.0, 2.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(poles[2], Point3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn rational_curve_with_corner_is_rejected() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let curve = NurbsCurve::new(
            1,
            vec![
                Point3::origin(),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(5.0, 5.0, 0.0),
            ],
            Some(vec![1.0, 2.0, 1.0]),
            KnotVector::clamped_uniform(3, 1).unwrap(),
        )
        .unwrap();
        let err = f
            .curve(&SourceCurve::Nurbs { curve, periodic: false }, along_x(true))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedGeometry(_)));
        assert!(f.created().is_empty());
    }

    #[test]
    fn polyline_is_refitted_and_input_dropped() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let chain = SourceCurve::Composite(vec![
            SourceCurve::LineSegment {
                start: Point3::origin(),
                end: Point3::new(5.0, 0.0, 0.0),
            },
            SourceCurve::Nurbs {
                curve: polyline(vec![Point3::new(5.0, 0.0, 0.0), Point3::new(10.0, 1.0, 0.0)]),
                periodic: false,
            },
        ]);
        let tag = f.curve(&chain, along_x(true)).unwrap().tag().unwrap();
        assert_eq!(f.created(), &[tag]);
        assert_eq!(kernel.entity_count(), 1);
        assert!(kernel.find_curve_discontinuities(tag).unwrap().is_empty());
    }

    #[test]
    fn curved_piecewise_is_unsupported() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let chain = SourceCurve::Composite(vec![
            SourceCurve::LineSegment {
                start: Point3::origin(),
                end: Point3::new(1.0, 0.0, 0.0),
            },
            SourceCurve::CircularArc {
                frame: xy(),
                radius: 1.0,
                start_angle: 0.0,
                end_angle: 1.0,
            },
        ]);
        assert!(matches!(
            f.curve(&chain, along_x(true)),
            Err(Error::UnsupportedGeometry(_))
        ));
    }

    #[test]
    fn inward_cylinder_flips_face_bit() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let inward = SourceSurface::Cylinder {
            frame: xy(),
            radius: 2.0,
            outer_normal: false,
        };
        let (built, oriented) = f.surface(&inward, true).unwrap();
        assert!(built.tag().is_some());
        assert!(!oriented);
        let plane = SourceSurface::Plane { frame: xy() };
        assert!(f.surface(&plane, true).unwrap().1);
    }

    #[test]
    fn inward_elliptical_surfaces_flip_face_bit() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let cylinder = |outer_normal| SourceSurface::EllipticalCylinder {
            frame: xy(),
            major_radius: 3.0,
            minor_radius: 2.0,
            outer_normal,
        };
        let cone = SourceSurface::EllipticalCone {
            frame: xy(),
            major_radius: 3.0,
            minor_radius: 2.0,
            height: 4.0,
            outer_normal: false,
        };
        assert!(f.surface(&cylinder(true), true).unwrap().1);
        assert!(!f.surface(&cylinder(false), true).unwrap().1);
        assert!(f.surface(&cylinder(false), false).unwrap().1);
        assert!(!f.surface(&cone, true).unwrap().1);
    }

    #[test]
    fn elliptical_cone_passes_through_major_points() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let source = SourceSurface::EllipticalCone {
            frame: xy(),
            major_radius: 4.0,
            minor_radius: 2.0,
            height: 3.0,
            outer_normal: true,
        };
        let tag = f.surface(&source, true).unwrap().0.tag().unwrap();
        let Geom::Cone(cone) = kernel.geometry(tag).unwrap() else {
            panic!("expected a cone");
        };
        assert_relative_eq!(cone.radius, 4.0, epsilon = 1e-12);
        assert_relative_eq!(cone.semi_angle, (4.0_f64 / 3.0).atan(), epsilon = 1e-12);
        // Axis runs from the apex towards the base.
        assert_relative_eq!(cone.basis.axis, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn skewed_torus_is_retried() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let skew = Frame::from_axes(Point3::origin(), Vector3::z(), Vector3::new(1.0, 0.0, 0.3))
            .unwrap();
        let torus = SourceSurface::Torus {
            frame: skew,
            major_radius: 3.0,
            minor_radius: 1.0,
            outer_normal: true,
        };
        let tag = f.surface(&torus, true).unwrap().0.tag().unwrap();
        assert_eq!(kernel.geometry_class(tag), Ok(GeometryClass::Torus));
    }

    #[test]
    fn reversed_nurbs_normal_flips_face_bit() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let patch = NurbsSurface::new(
            1,
            1,
            2,
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(0.0, 5.0, 0.0),
                Point3::new(5.0, 5.0, 0.0),
            ],
            None,
            KnotVector::clamped_uniform(2, 1).unwrap(),
            KnotVector::clamped_uniform(2, 1).unwrap(),
        )
        .unwrap();
        let straight = SourceSurface::Nurbs {
            surface: patch.clone(),
            normal_reversed: false,
            periodic: (false, false),
        };
        let flipped = SourceSurface::Nurbs {
            surface: patch,
            normal_reversed: true,
            periodic: (false, false),
        };
        assert!(f.surface(&straight, true).unwrap().1);
        assert!(!f.surface(&flipped, true).unwrap().1);
    }

    /// Linear along z, closed around it by a smooth quadratic loop.
    fn tube() -> NurbsSurface {
        let ring = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)];
        let mut net = Vec::new();
        for (x, y) in ring {
            net.push(Point3::new(x, y, 0.0));
            net.push(Point3::new(x, y, 5.0));
        }
        NurbsSurface::new(
            1,
            2,
            2,
            4,
            net,
            None,
            KnotVector::clamped_uniform(2, 1).unwrap(),
            KnotVector::clamped_uniform(4, 2).unwrap(),
        )
        .unwrap()
    }

    fn tube_periodicity(periodic: (bool, bool)) -> (bool, bool) {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let source = SourceSurface::Nurbs {
            surface: tube(),
            normal_reversed: false,
            periodic,
        };
        let (built, oriented) = f.surface(&source, true).unwrap();
        assert!(oriented);
        let tag = built.tag().unwrap();
        let Geom::BSurface { periodic, .. } = kernel.geometry(tag).unwrap() else {
            panic!("expected a b-surface");
        };
        *periodic
    }

    #[test]
    fn closed_patch_keeps_its_periodic_direction() {
        // Periodic around the tube; the open axial direction is dropped.
        assert_eq!(tube_periodicity((true, true)), (false, true));
        assert_eq!(tube_periodicity((false, true)), (false, true));
        assert_eq!(tube_periodicity((false, false)), (false, false));
    }

    #[test]
    fn singular_point_sits_at_cone_apex() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let mut f = GeometryFactory::new(&mut kernel, identity(), &config);
        let cone = SourceSurface::Cone {
            base_center: Point3::origin(),
            apex: Point3::new(0.0, 0.0, 4.0),
            axis_of_symmetry: Vector3::z(),
            ref_axis: Vector3::x(),
            base_radius: 2.0,
            half_angle: 0.5_f64.atan(),
            outer_normal: true,
        };
        let nothing = f
            .singular_point(&SourceSurface::Unsupported("procedural".into()))
            .unwrap();
        assert!(matches!(nothing, Construction::Degraded(_)));

        let tag = f.singular_point(&cone).unwrap().tag().unwrap();
        assert_relative_eq!(kernel.point_position(tag).unwrap(), Point3::new(0.0, 0.0, 4.0));
    }

    #[test]
    fn scaled_radii_follow_the_normalization() {
        let mut kernel = MemoryKernel::new();
        let config = TranslatorConfig::default();
        let big = Extents::new(Point3::new(-5000.0, -5000.0, -5000.0), Point3::new(5000.0, 5000.0, 5000.0));
        let norm = normalize(&big, &config.normalizer_settings()).unwrap();
        let scale = norm.to_kernel.scale;
        let mut f = GeometryFactory::new(&mut kernel, norm, &config);
        let sphere = SourceSurface::Sphere {
            frame: xy(),
            radius: 1000.0,
            outer_normal: true,
        };
        let tag = f.surface(&sphere, true).unwrap().0.tag().unwrap();
        let Geom::Sphere(s) = kernel.geometry(tag).unwrap() else {
            panic!("expected a sphere");
        };
        assert_relative_eq!(s.radius, 1000.0 * scale, epsilon = 1e-9);
    }
}
