// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face surfaces as described by the source modeler.
//!
//! Analytic surfaces carry a closed-form parameterization used for sampling:
//! `u` runs along the axis (or latitude/tube angle for sphere and torus),
//! `v` is the angle about the axis measured from the frame's reference
//! direction.

use brep_bridge_geometry::{Extents, Frame, NurbsSurface};
use nalgebra::{Point3, Vector3};

/// The surface underlying a source face.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceSurface {
    Plane {
        frame: Frame,
    },
    Cylinder {
        frame: Frame,
        radius: f64,
        outer_normal: bool,
    },
    /// A right circular cone described by its base circle and apex.
    Cone {
        base_center: Point3<f64>,
        apex: Point3<f64>,
        axis_of_symmetry: Vector3<f64>,
        ref_axis: Vector3<f64>,
        base_radius: f64,
        half_angle: f64,
        outer_normal: bool,
    },
    Sphere {
        frame: Frame,
        radius: f64,
        outer_normal: bool,
    },
    Torus {
        frame: Frame,
        major_radius: f64,
        minor_radius: f64,
        outer_normal: bool,
    },
    /// Elliptical base in the frame's plane, apex `height` along the axis.
    EllipticalCone {
        frame: Frame,
        major_radius: f64,
        minor_radius: f64,
        height: f64,
        outer_normal: bool,
    },
    EllipticalCylinder {
        frame: Frame,
        major_radius: f64,
        minor_radius: f64,
        outer_normal: bool,
    },
    Nurbs {
        surface: NurbsSurface,
        normal_reversed: bool,
        /// Periodicity the source reports in U and V.
        periodic: (bool, bool),
    },
    Unsupported(String),
}

impl SourceSurface {
    pub fn kind_name(&self) -> &'static str {
        match self {
            SourceSurface::Plane { .. } => "plane",
            SourceSurface::Cylinder { .. } => "cylinder",
            SourceSurface::Cone { .. } => "cone",
            SourceSurface::Sphere { .. } => "sphere",
            SourceSurface::Torus { .. } => "torus",
            SourceSurface::EllipticalCone { .. } => "elliptical cone",
            SourceSurface::EllipticalCylinder { .. } => "elliptical cylinder",
            SourceSurface::Nurbs { .. } => "nurbs surface",
            SourceSurface::Unsupported(_) => "unsupported surface",
        }
    }

    /// Evaluates the parameterization; `None` for unsupported surfaces.
    pub fn point_at(&self, u: f64, v: f64) -> Option<Point3<f64>> {
        let (s, c) = v.sin_cos();
        let p = match self {
            SourceSurface::Plane { frame } => frame.point_in_plane(u, v),
            SourceSurface::Cylinder { frame, radius, .. } => {
                frame.point_in_plane(radius * c, radius * s) + frame.axis * u
            }
            SourceSurface::Cone {
                base_center,
                apex,
                axis_of_symmetry,
                ref_axis,
                base_radius,
                ..
            } => {
                let y = axis_of_symmetry.cross(ref_axis);
                let rim = base_center + (ref_axis * c + y * s) * *base_radius;
                rim + (apex - rim) * u
            }
            SourceSurface::Sphere { frame, radius, .. } => {
                let (su, cu) = u.sin_cos();
                frame.point_in_plane(radius * cu * c, radius * cu * s) + frame.axis * (radius * su)
            }
            SourceSurface::Torus {
                frame,
                major_radius,
                minor_radius,
                ..
            } => {
                let (su, cu) = u.sin_cos();
                let ring = major_radius + minor_radius * cu;
                frame.point_in_plane(ring * c, ring * s) + frame.axis * (minor_radius * su)
            }
            SourceSurface::EllipticalCone {
                frame,
                major_radius,
                minor_radius,
                height,
                ..
            } => {
                let shrink = 1.0 - u;
                frame.point_in_plane(shrink * major_radius * c, shrink * minor_radius * s)
                    + frame.axis * (u * height)
            }
            SourceSurface::EllipticalCylinder {
                frame,
                major_radius,
                minor_radius,
                ..
            } => frame.point_in_plane(major_radius * c, minor_radius * s) + frame.axis * u,
            SourceSurface::Nurbs { surface, .. } => surface.point_at(u, v),
            SourceSurface::Unsupported(_) => return None,
        };
        Some(p)
    }

    /// Unit normal of a NURBS face surface, honouring `normal_reversed`.
    ///
    /// Analytic surfaces report their normal side through `outer_normal`
    /// instead and return `None` here.
    pub fn nurbs_normal_at(&self, u: f64, v: f64) -> Option<Vector3<f64>> {
        match self {
            SourceSurface::Nurbs {
                surface,
                normal_reversed,
                ..
            } => surface
                .normal_at(u, v)
                .map(|n| if *normal_reversed { -n } else { n }),
            _ => None,
        }
    }

    /// Single point standing in for a loop that collapses to a vertex.
    ///
    /// Cones use their apex, planes their origin; everything else is
    /// evaluated at the parametric origin.
    pub fn representative_point(&self) -> Option<Point3<f64>> {
        match self {
            SourceSurface::Cone { apex, .. } => Some(*apex),
            SourceSurface::EllipticalCone { frame, height, .. } => {
                Some(frame.origin + frame.axis * *height)
            }
            SourceSurface::Plane { frame } => Some(frame.origin),
            _ => self.point_at(0.0, 0.0),
        }
    }

    /// Axis-aligned box of surfaces that are bounded without trimming.
    /// Free-form patches give the box of their control net.
    pub fn hull_extent(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        match self {
            SourceSurface::Sphere { frame, radius, .. } => {
                let r = Vector3::repeat(radius.abs());
                Some((frame.origin - r, frame.origin + r))
            }
            SourceSurface::Torus {
                frame,
                major_radius,
                minor_radius,
                ..
            } => {
                let r = Vector3::repeat(major_radius.abs() + minor_radius.abs());
                Some((frame.origin - r, frame.origin + r))
            }
            SourceSurface::Nurbs { surface, .. } => {
                Extents::from_points(&surface.control_points()).map(|e| (e.min, e.max))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn frame() -> Frame {
        Frame::from_axes(Point3::origin(), Vector3::z(), Vector3::x()).unwrap()
    }

    #[test]
    fn elliptical_cone_samples() {
        let s = SourceSurface::EllipticalCone {
            frame: frame(),
            major_radius: 4.0,
            minor_radius: 2.0,
            height: 6.0,
            outer_normal: true,
        };
        assert_relative_eq!(s.point_at(0.0, 0.0).unwrap(), Point3::new(4.0, 0.0, 0.0));
        assert_relative_eq!(
            s.point_at(0.0, FRAC_PI_2).unwrap(),
            Point3::new(0.0, 2.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(s.point_at(1.0, 0.0).unwrap(), Point3::new(0.0, 0.0, 6.0));
        assert_eq!(s.representative_point(), Some(Point3::new(0.0, 0.0, 6.0)));
    }

    #[test]
    fn cone_runs_from_rim_to_apex() {
        let s = SourceSurface::Cone {
            base_center: Point3::origin(),
            apex: Point3::new(0.0, 0.0, 2.0),
            axis_of_symmetry: Vector3::z(),
            ref_axis: Vector3::x(),
            base_radius: 1.0,
            half_angle: 0.5_f64.atan(),
            outer_normal: true,
        };
        assert_relative_eq!(s.point_at(0.0, 0.0).unwrap(), Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(s.point_at(1.0, 1.3).unwrap(), Point3::new(0.0, 0.0, 2.0));
        assert_eq!(s.representative_point(), Some(Point3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn torus_outer_equator() {
        let s = SourceSurface::Torus {
            frame: frame(),
            major_radius: 5.0,
            minor_radius: 1.0,
            outer_normal: true,
        };
        assert_relative_eq!(s.point_at(0.0, 0.0).unwrap(), Point3::new(6.0, 0.0, 0.0));
        let (lo, hi) = s.hull_extent().unwrap();
        assert_relative_eq!(hi - lo, Vector3::repeat(12.0));
    }

    #[test]
    fn unsupported_surface_has_no_samples() {
        let s = SourceSurface::Unsupported("offset".into());
        assert!(s.point_at(0.0, 0.0).is_none());
        assert!(s.representative_point().is_none());
    }
}
