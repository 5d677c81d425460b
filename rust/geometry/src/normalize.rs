// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fitting a body into the target kernel's modeling cube.
//!
//! Target kernels model inside a fixed cube centered at the origin. A body
//! that is too large, too small, or simply off-center is brought into that
//! cube with a uniform scale and a translation. The inverse transform is
//! returned so the caller can place the translated body back where it came
//! from.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transform::Similarity;

/// Body sizes at or below this are treated as a point.
pub const MIN_BODY_SIZE: f64 = 1e-10;

/// Axis-aligned bounding extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Extents {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Extents of a point set, `None` when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = *it.next()?;
        let mut ext = Self::new(first, first);
        for p in it {
            ext.include(p);
        }
        Some(ext)
    }

    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &Extents) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Length of the diagonal.
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Whether every corner lies inside `[-half, half]^3`.
    pub fn within_cube(&self, half: f64) -> bool {
        self.min.iter().all(|c| *c >= -half) && self.max.iter().all(|c| *c <= half)
    }

    pub fn transformed(&self, t: &Similarity) -> Self {
        // Uniform positive scale preserves min/max ordering.
        Self {
            min: t.apply_point(&self.min),
            max: t.apply_point(&self.max),
        }
    }
}

/// Parameters of the modeling cube and the scaling policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerSettings {
    /// Edge length of the admissible cube, centered at the origin.
    pub size_box: f64,
    /// Bodies smaller than this are enlarged.
    pub min_body_size: f64,
    /// Fraction of the cube a shrunk body should occupy.
    pub shrink_margin: f64,
    /// Fraction of the cube an enlarged body should occupy.
    pub enlarge_margin: f64,
    /// Vertex tolerance as a fraction of the effective body size.
    pub tolerance_factor: f64,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            size_box: 1000.0,
            min_body_size: 10.0,
            shrink_margin: 0.8,
            enlarge_margin: 0.5,
            tolerance_factor: 1e-5,
        }
    }
}

/// Outcome of normalizing one body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Source space → kernel space.
    pub to_kernel: Similarity,
    /// Kernel space → source space.
    pub to_source: Similarity,
    /// Vertex tolerance in kernel space.
    pub vertex_tolerance: f64,
    /// Diagonal of the source extents.
    pub body_size: f64,
    /// Whether a scale was applied.
    pub scaled: bool,
}

impl Normalization {
    /// Whether any transform is applied at all.
    pub fn is_identity(&self) -> bool {
        self.to_kernel.is_identity()
    }

    pub fn point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.to_kernel.apply_point(p)
    }

    pub fn vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.to_kernel.apply_vector(v)
    }

    pub fn length(&self, l: f64) -> f64 {
        self.to_kernel.apply_length(l)
    }
}

/// Compute the transform that fits `extents` into the modeling cube.
pub fn normalize(extents: &Extents, settings: &NormalizerSettings) -> Result<Normalization> {
    let body_size = extents.diagonal();
    if !body_size.is_finite() || body_size <= MIN_BODY_SIZE {
        return Err(Error::DegenerateExtents(body_size));
    }

    let mut scale = 1.0;
    let mut effective_size = body_size;
    let scaled = body_size > settings.size_box || body_size < settings.min_body_size;
    if scaled {
        let fit = settings.size_box / body_size;
        scale = if body_size > settings.size_box {
            fit * settings.shrink_margin
        } else {
            fit * settings.enlarge_margin
        };
        // Tolerance is based on the shrink target even when enlarging.
        effective_size = body_size * fit * settings.shrink_margin;
    }

    let mut translation = Vector3::zeros();
    if scaled || !extents.within_cube(0.5 * settings.size_box) {
        translation = -extents.center().coords * scale;
    }

    let to_kernel = Similarity::new(scale, translation);
    Ok(Normalization {
        to_kernel,
        to_source: to_kernel.inverse(),
        vertex_tolerance: settings.tolerance_factor * effective_size,
        body_size,
        scaled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(min: f64, max: f64) -> Extents {
        Extents::new(Point3::new(min, min, min), Point3::new(max, max, max))
    }

    #[test]
    fn in_range_body_is_untouched() {
        let n = normalize(&cube(0.0, 100.0), &NormalizerSettings::default()).unwrap();
        assert!(n.is_identity());
        assert!(!n.scaled);
        assert_relative_eq!(n.vertex_tolerance, 1e-5 * n.body_size);
    }

    #[test]
    fn large_body_is_shrunk_to_eighty_percent() {
        let ext = cube(-5000.0, 5000.0);
        let n = normalize(&ext, &NormalizerSettings::default()).unwrap();
        assert!(n.scaled);
        let moved = ext.transformed(&n.to_kernel);
        assert_relative_eq!(moved.diagonal(), 800.0, epsilon = 1e-9);
        assert!(moved.within_cube(500.0));
        assert_relative_eq!(n.vertex_tolerance, 1e-5 * 800.0, epsilon = 1e-15);
    }

    #[test]
    fn small_body_is_enlarged_to_half() {
        let ext = cube(2.0, 3.0);
        let n = normalize(&ext, &NormalizerSettings::default()).unwrap();
        assert!(n.scaled);
        let moved = ext.transformed(&n.to_kernel);
        assert_relative_eq!(moved.diagonal(), 500.0, epsilon = 1e-9);
        assert_relative_eq!(moved.center(), Point3::origin(), epsilon = 1e-9);
        // Tolerance keeps the shrink-target base.
        assert_relative_eq!(n.vertex_tolerance, 1e-5 * 800.0, epsilon = 1e-15);
    }

    #[test]
    fn off_center_body_is_translated_only() {
        let ext = Extents::new(Point3::new(900.0, 0.0, 0.0), Point3::new(1000.0, 10.0, 10.0));
        let n = normalize(&ext, &NormalizerSettings::default()).unwrap();
        assert!(!n.scaled);
        assert_eq!(n.to_kernel.scale, 1.0);
        let moved = ext.transformed(&n.to_kernel);
        assert_relative_eq!(moved.center(), Point3::origin(), epsilon = 1e-9);
    }

    #[test]
    fn inverse_maps_back() {
        let ext = cube(-5000.0, 5000.0);
        let n = normalize(&ext, &NormalizerSettings::default()).unwrap();
        let p = Point3::new(1234.0, -42.0, 7.0);
        assert_relative_eq!(n.to_source.apply_point(&n.point(&p)), p, epsilon = 1e-9);
    }

    #[test]
    fn point_sized_body_is_degenerate() {
        let ext = cube(1.0, 1.0);
        assert!(matches!(
            normalize(&ext, &NormalizerSettings::default()),
            Err(Error::DegenerateExtents(_))
        ));
    }

    #[test]
    fn scaled_bodies_always_fit() {
        let settings = NormalizerSettings::default();
        for &(lo, hi) in &[(0.0, 0.001), (-1e6, 3.0), (10.0, 12.0), (7e4, 9e4)] {
            let ext = Extents::new(Point3::new(lo, lo * 0.5, 0.0), Point3::new(hi, hi, hi * 0.25));
            let n = normalize(&ext, &settings).unwrap();
            assert!(ext.transformed(&n.to_kernel).within_cube(0.5 * settings.size_box));
        }
    }
}
