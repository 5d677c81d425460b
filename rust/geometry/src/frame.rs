// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Basis frames (origin + axis + reference direction).
//!
//! Analytic curves and surfaces are positioned by a frame. Source data does
//! not always deliver a perfectly orthogonal pair of directions, so a frame
//! keeps what it was given (normalized) and [`Frame::orthogonalized`] is
//! available when a consumer insists on a right-handed orthonormal basis.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transform::Similarity;

/// Tolerance below which a direction is considered zero-length.
pub const DIRECTION_TOLERANCE: f64 = 1e-12;

/// Cosine tolerance for treating two directions as orthogonal.
pub const ORTHOGONAL_TOLERANCE: f64 = 1e-9;

/// A placement: origin, main axis and an in-plane reference direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point3<f64>,
    /// Unit main axis (normal for planes and circles, symmetry axis otherwise).
    pub axis: Vector3<f64>,
    /// Unit reference direction, the local X axis.
    pub ref_direction: Vector3<f64>,
}

impl Frame {
    /// Build a frame from raw directions, normalizing both.
    pub fn from_axes(
        origin: Point3<f64>,
        axis: Vector3<f64>,
        ref_direction: Vector3<f64>,
    ) -> Result<Self> {
        Ok(Self {
            origin,
            axis: unit(&axis, "axis")?,
            ref_direction: unit(&ref_direction, "reference direction")?,
        })
    }

    /// Build a frame from an axis alone, picking a perpendicular reference.
    pub fn from_axis(origin: Point3<f64>, axis: Vector3<f64>) -> Result<Self> {
        let axis = unit(&axis, "axis")?;
        Ok(Self {
            origin,
            axis,
            ref_direction: any_perpendicular(&axis),
        })
    }

    /// Whether the stored directions are orthogonal within tolerance.
    pub fn is_orthogonal(&self) -> bool {
        self.axis.dot(&self.ref_direction).abs() <= ORTHOGONAL_TOLERANCE
    }

    /// Project the reference direction onto the plane perpendicular to the
    /// axis. Falls back to an arbitrary perpendicular when the two are
    /// parallel.
    pub fn orthogonalized(&self) -> Self {
        let projected = self.ref_direction - self.axis * self.ref_direction.dot(&self.axis);
        let ref_direction = if projected.norm() > 1e-6 {
            projected.normalize()
        } else {
            any_perpendicular(&self.axis)
        };
        Self {
            origin: self.origin,
            axis: self.axis,
            ref_direction,
        }
    }

    /// Local Y axis (`axis × ref_direction`).
    pub fn y_direction(&self) -> Vector3<f64> {
        self.axis.cross(&self.ref_direction)
    }

    /// The same frame with its axis pointing the other way. The reference
    /// direction is kept, so the local Y axis flips with it.
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            axis: -self.axis,
            ref_direction: self.ref_direction,
        }
    }

    /// Map the origin through a similarity; directions are scale-invariant.
    pub fn transformed(&self, t: &Similarity) -> Self {
        Self {
            origin: t.apply_point(&self.origin),
            axis: self.axis,
            ref_direction: self.ref_direction,
        }
    }

    /// Point at local coordinates `(x, y)` in the frame's plane.
    pub fn point_in_plane(&self, x: f64, y: f64) -> Point3<f64> {
        self.origin + self.ref_direction * x + self.y_direction() * y
    }
}

fn unit(v: &Vector3<f64>, what: &str) -> Result<Vector3<f64>> {
    let n = v.norm();
    if !n.is_finite() || n <= DIRECTION_TOLERANCE {
        return Err(Error::DegenerateFrame(format!("zero-length {what}")));
    }
    Ok(v / n)
}

/// A unit vector perpendicular to `axis`.
pub fn any_perpendicular(axis: &Vector3<f64>) -> Vector3<f64> {
    if axis.z.abs() < 0.9 {
        Vector3::z().cross(axis).normalize()
    } else {
        Vector3::x().cross(axis).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_axes_normalizes_without_orthogonalizing() {
        let f = Frame::from_axes(
            Point3::origin(),
            Vector3::new(0.0, 0.0, 2.0),
            Vector3::new(1.0, 0.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(f.axis.norm(), 1.0);
        assert_relative_eq!(f.ref_direction.norm(), 1.0);
        assert!(!f.is_orthogonal());
    }

    #[test]
    fn orthogonalized_projects_reference() {
        let f = Frame::from_axes(
            Point3::origin(),
            Vector3::z(),
            Vector3::new(1.0, 0.0, 1.0),
        )
        .unwrap()
        .orthogonalized();
        assert!(f.is_orthogonal());
        assert_relative_eq!(f.ref_direction, Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(f.y_direction(), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn parallel_reference_falls_back_to_perpendicular() {
        let f = Frame::from_axes(Point3::origin(), Vector3::x(), Vector3::x())
            .unwrap()
            .orthogonalized();
        assert!(f.is_orthogonal());
        assert_relative_eq!(f.ref_direction.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_axis_is_rejected() {
        let err = Frame::from_axes(Point3::origin(), Vector3::zeros(), Vector3::x());
        assert!(matches!(err, Err(Error::DegenerateFrame(_))));
    }

    #[test]
    fn transform_moves_origin_only() {
        let f = Frame::from_axis(Point3::new(1.0, 1.0, 1.0), Vector3::z()).unwrap();
        let t = Similarity::new(2.0, Vector3::new(0.0, 0.0, -1.0));
        let g = f.transformed(&t);
        assert_relative_eq!(g.origin, Point3::new(2.0, 2.0, 1.0));
        assert_relative_eq!(g.axis, f.axis);
    }
}
