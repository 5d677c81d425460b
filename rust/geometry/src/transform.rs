// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform-scale + translation transforms.
//!
//! The translator never rotates a body, so the full affine machinery is
//! reduced to a similarity `p' = s * p + t`. Directions pass through
//! unchanged; lengths (radii, offsets) are multiplied by `s`.

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A uniform scale followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Similarity {
    pub scale: f64,
    pub translation: Vector3<f64>,
}

impl Default for Similarity {
    fn default() -> Self {
        Self::identity()
    }
}

impl Similarity {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            translation: Vector3::zeros(),
        }
    }

    pub fn new(scale: f64, translation: Vector3<f64>) -> Self {
        Self { scale, translation }
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.translation == Vector3::zeros()
    }

    /// Map a position.
    #[inline]
    pub fn apply_point(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(p.coords * self.scale + self.translation)
    }

    /// Map a free vector (no translation).
    #[inline]
    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        v * self.scale
    }

    /// Map a length such as a radius.
    #[inline]
    pub fn apply_length(&self, length: f64) -> f64 {
        length * self.scale
    }

    /// Inverse transform. A zero scale has no inverse and maps to identity
    /// scale, which never happens for a normalizer-produced transform.
    pub fn inverse(&self) -> Self {
        let inv = if self.scale != 0.0 { 1.0 / self.scale } else { 1.0 };
        Self {
            scale: inv,
            translation: -self.translation * inv,
        }
    }

    /// `self` after `other`: `self(other(p))`.
    pub fn compose(&self, other: &Similarity) -> Self {
        Self {
            scale: self.scale * other.scale,
            translation: other.translation * self.scale + self.translation,
        }
    }

    /// Homogeneous 4x4 form, column-major in nalgebra.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity() * self.scale;
        m[(3, 3)] = 1.0;
        m[(0, 3)] = self.translation.x;
        m[(1, 3)] = self.translation.y;
        m[(2, 3)] = self.translation.z;
        m
    }
}
