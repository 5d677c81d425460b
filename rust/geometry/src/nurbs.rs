// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rational B-spline curves and surfaces.
//!
//! Control points are stored **homogeneous**: `(w·x, w·y, w·z, w)`. This is
//! the form most solid-modeling kernels take on input, it makes uniform
//! transforms and iso-curve extraction linear, and a non-rational spline is
//! simply one whose weights are all `1`.
//!
//! Surfaces store their control net with U varying fastest:
//! `poles[v_index * n_u + u_index]`.

use nalgebra::{Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::error::{Error, Result};
use crate::knots::{KnotVector, Side, KNOT_TOLERANCE};
use crate::transform::Similarity;

/// Default angular tolerance (radians) for G1 checks.
pub const G1_ANGLE_TOLERANCE: f64 = 1e-6;

/// Default relative tolerance for C1 checks.
pub const C1_RELATIVE_TOLERANCE: f64 = 1e-6;

/// Evaluate the `degree + 1` non-zero basis functions on `span` at `t`
/// (Cox-de Boor, triangular scheme).
pub(crate) fn basis_functions(
    knots: &[f64],
    span: usize,
    degree: usize,
    t: f64,
) -> SmallVec<[f64; 8]> {
    let mut n: SmallVec<[f64; 8]> = smallvec![0.0; degree + 1];
    let mut left: SmallVec<[f64; 8]> = smallvec![0.0; degree + 1];
    let mut right: SmallVec<[f64; 8]> = smallvec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            // Zero-length knot interval
            let temp = if denom.abs() < 1e-300 { 0.0 } else { n[r] / denom };
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

fn homogenize(points: &[Point3<f64>], weights: Option<&[f64]>) -> Result<Vec<Vector4<f64>>> {
    match weights {
        None => Ok(points
            .iter()
            .map(|p| Vector4::new(p.x, p.y, p.z, 1.0))
            .collect()),
        Some(w) => {
            if w.len() != points.len() {
                return Err(Error::InvalidControlNet(format!(
                    "{} weights for {} control points",
                    w.len(),
                    points.len()
                )));
            }
            if let Some(bad) = w.iter().find(|w| !(**w > 0.0) || !w.is_finite()) {
                return Err(Error::InvalidControlNet(format!("non-positive weight {bad}")));
            }
            Ok(points
                .iter()
                .zip(w)
                .map(|(p, &w)| Vector4::new(p.x * w, p.y * w, p.z * w, w))
                .collect())
        }
    }
}

fn dehomogenize(h: &Vector4<f64>) -> Point3<f64> {
    Point3::new(h.x / h.w, h.y / h.w, h.z / h.w)
}

fn transform_homogeneous(h: &Vector4<f64>, t: &Similarity) -> Vector4<f64> {
    Vector4::new(
        h.x * t.scale + t.translation.x * h.w,
        h.y * t.scale + t.translation.y * h.w,
        h.z * t.scale + t.translation.z * h.w,
        h.w,
    )
}

// ============================================================================
// Curves
// ============================================================================

/// A (possibly rational) B-spline curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurbsCurve {
    degree: usize,
    poles: Vec<Vector4<f64>>,
    rational: bool,
    knots: KnotVector,
}

impl NurbsCurve {
    /// Build from Cartesian control points and optional weights.
    pub fn new(
        degree: usize,
        control_points: Vec<Point3<f64>>,
        weights: Option<Vec<f64>>,
        knots: KnotVector,
    ) -> Result<Self> {
        knots.validate(degree, control_points.len())?;
        // Too few weights: the curve is read as non-rational.
        let weights = weights.filter(|w| w.len() >= control_points.len());
        let rational = weights.is_some();
        let poles = homogenize(&control_points, weights.as_deref())?;
        Ok(Self {
            degree,
            poles,
            rational,
            knots,
        })
    }

    /// Build from homogeneous poles.
    pub fn from_homogeneous(
        degree: usize,
        poles: Vec<Vector4<f64>>,
        rational: bool,
        knots: KnotVector,
    ) -> Result<Self> {
        knots.validate(degree, poles.len())?;
        if poles.iter().any(|p| !(p.w > 0.0)) {
            return Err(Error::InvalidControlNet("non-positive weight".into()));
        }
        Ok(Self {
            degree,
            poles,
            rational,
            knots,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    pub fn is_rational(&self) -> bool {
        self.rational
    }

    pub fn len(&self) -> usize {
        self.poles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poles.is_empty()
    }

    /// Homogeneous control points `(w·x, w·y, w·z, w)`.
    pub fn homogeneous_poles(&self) -> &[Vector4<f64>] {
        &self.poles
    }

    /// Cartesian control points.
    pub fn control_points(&self) -> Vec<Point3<f64>> {
        self.poles.iter().map(dehomogenize).collect()
    }

    /// Weights, `None` for a non-rational curve.
    pub fn weights(&self) -> Option<Vec<f64>> {
        self.rational
            .then(|| self.poles.iter().map(|p| p.w).collect())
    }

    pub fn domain(&self) -> (f64, f64) {
        self.knots.domain(self.degree, self.poles.len())
    }

    fn eval_homogeneous(&self, t: f64, side: Side) -> Vector4<f64> {
        let (a, b) = self.domain();
        let t = t.clamp(a, b);
        let span = self.knots.find_span(self.degree, self.poles.len(), t, side);
        let basis = basis_functions(self.knots.as_slice(), span, self.degree, t);
        let mut acc = Vector4::zeros();
        for (r, n) in basis.iter().enumerate() {
            acc += self.poles[span - self.degree + r] * *n;
        }
        acc
    }

    /// Curve point at `t` (clamped to the domain).
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        dehomogenize(&self.eval_homogeneous(t, Side::Right))
    }

    pub fn start_point(&self) -> Point3<f64> {
        self.point_at(self.domain().0)
    }

    pub fn end_point(&self) -> Point3<f64> {
        let (_, b) = self.domain();
        dehomogenize(&self.eval_homogeneous(b, Side::Left))
    }

    /// Homogeneous hodograph: degree `p - 1`, not validated.
    fn hodograph(&self) -> NurbsCurve {
        let p = self.degree;
        let k = self.knots.as_slice();
        let poles = self
            .poles
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let span = k[i + p + 1] - k[i + 1];
                if span.abs() <= KNOT_TOLERANCE {
                    Vector4::zeros()
                } else {
                    (w[1] - w[0]) * (p as f64 / span)
                }
            })
            .collect();
        NurbsCurve {
            degree: p - 1,
            poles,
            rational: self.rational,
            knots: self.knots.derivative(),
        }
    }

    /// First derivative at `t`, approached from `side`.
    pub fn derivative_at(&self, t: f64, side: Side) -> Vector3<f64> {
        let a = self.eval_homogeneous(t, side);
        let da = self.hodograph().eval_homogeneous(t, side);
        let c = a.xyz() / a.w;
        (da.xyz() - c * da.w) / a.w
    }

    /// Whether start and end coincide within `tolerance`.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        (self.end_point() - self.start_point()).norm() <= tolerance
    }

    /// The same point set traversed the other way: `t' = a + b - t`.
    pub fn reversed(&self) -> Self {
        Self {
            degree: self.degree,
            poles: self.poles.iter().rev().copied().collect(),
            rational: self.rational,
            knots: self.knots.reversed(),
        }
    }

    pub fn transformed(&self, t: &Similarity) -> Self {
        Self {
            degree: self.degree,
            poles: self
                .poles
                .iter()
                .map(|h| transform_homogeneous(h, t))
                .collect(),
            rational: self.rational,
            knots: self.knots.clone(),
        }
    }

    /// Candidate break parameters: interior knots whose multiplicity drops
    /// the parametric continuity to C0 or below.
    fn break_candidates(&self) -> Vec<f64> {
        self.knots
            .interior_breaks(self.degree, self.poles.len(), self.degree)
    }

    /// Interior parameters where the tangent direction jumps.
    pub fn g1_discontinuities(&self, angle_tolerance: f64) -> Vec<f64> {
        self.break_candidates()
            .into_iter()
            .filter(|&t| {
                let l = self.derivative_at(t, Side::Left);
                let r = self.derivative_at(t, Side::Right);
                let (nl, nr) = (l.norm(), r.norm());
                if nl <= f64::EPSILON || nr <= f64::EPSILON {
                    return true;
                }
                let cos = (l.dot(&r) / (nl * nr)).clamp(-1.0, 1.0);
                cos.acos() > angle_tolerance
            })
            .collect()
    }

    /// Interior parameters where the first derivative jumps in direction or
    /// magnitude.
    pub fn c1_discontinuities(&self, relative_tolerance: f64) -> Vec<f64> {
        self.break_candidates()
            .into_iter()
            .filter(|&t| {
                let l = self.derivative_at(t, Side::Left);
                let r = self.derivative_at(t, Side::Right);
                let scale = l.norm().max(r.norm()).max(f64::EPSILON);
                (l - r).norm() > relative_tolerance * scale
            })
            .collect()
    }
}

// ============================================================================
// Surfaces
// ============================================================================

/// A (possibly rational) tensor-product B-spline surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurbsSurface {
    u_degree: usize,
    v_degree: usize,
    n_u: usize,
    n_v: usize,
    poles: Vec<Vector4<f64>>,
    rational: bool,
    u_knots: KnotVector,
    v_knots: KnotVector,
}

impl NurbsSurface {
    /// Build from a U-fastest control net and optional weights.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        u_degree: usize,
        v_degree: usize,
        n_u: usize,
        n_v: usize,
        control_points: Vec<Point3<f64>>,
        weights: Option<Vec<f64>>,
        u_knots: KnotVector,
        v_knots: KnotVector,
    ) -> Result<Self> {
        if control_points.len() != n_u * n_v {
            return Err(Error::InvalidControlNet(format!(
                "{} control points for a {}x{} net",
                control_points.len(),
                n_u,
                n_v
            )));
        }
        u_knots.validate(u_degree, n_u)?;
        v_knots.validate(v_degree, n_v)?;
        let weights = weights.filter(|w| w.len() >= control_points.len());
        let rational = weights.is_some();
        let poles = homogenize(&control_points, weights.as_deref())?;
        Ok(Self {
            u_degree,
            v_degree,
            n_u,
            n_v,
            poles,
            rational,
            u_knots,
            v_knots,
        })
    }

    /// Build from homogeneous poles (U fastest).
    #[allow(clippy::too_many_arguments)]
    pub fn from_homogeneous(
        u_degree: usize,
        v_degree: usize,
        n_u: usize,
        n_v: usize,
        poles: Vec<Vector4<f64>>,
        rational: bool,
        u_knots: KnotVector,
        v_knots: KnotVector,
    ) -> Result<Self> {
        if poles.len() != n_u * n_v {
            return Err(Error::InvalidControlNet(format!(
                "{} poles for a {}x{} net",
                poles.len(),
                n_u,
                n_v
            )));
        }
        u_knots.validate(u_degree, n_u)?;
        v_knots.validate(v_degree, n_v)?;
        Ok(Self {
            u_degree,
            v_degree,
            n_u,
            n_v,
            poles,
            rational,
            u_knots,
            v_knots,
        })
    }

    pub fn degrees(&self) -> (usize, usize) {
        (self.u_degree, self.v_degree)
    }

    pub fn net_size(&self) -> (usize, usize) {
        (self.n_u, self.n_v)
    }

    pub fn u_knots(&self) -> &KnotVector {
        &self.u_knots
    }

    pub fn v_knots(&self) -> &KnotVector {
        &self.v_knots
    }

    pub fn is_rational(&self) -> bool {
        self.rational
    }

    pub fn homogeneous_poles(&self) -> &[Vector4<f64>] {
        &self.poles
    }

    pub fn control_points(&self) -> Vec<Point3<f64>> {
        self.poles.iter().map(dehomogenize).collect()
    }

    pub fn weights(&self) -> Option<Vec<f64>> {
        self.rational
            .then(|| self.poles.iter().map(|p| p.w).collect())
    }

    pub fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (
            self.u_knots.domain(self.u_degree, self.n_u),
            self.v_knots.domain(self.v_degree, self.n_v),
        )
    }

    fn contract(
        knots: &KnotVector,
        degree: usize,
        count: usize,
        t: f64,
        side: Side,
    ) -> (usize, SmallVec<[f64; 8]>) {
        let (a, b) = knots.domain(degree, count);
        let t = t.clamp(a, b);
        let span = knots.find_span(degree, count, t, side);
        (span, basis_functions(knots.as_slice(), span, degree, t))
    }

    /// The iso-parametric curve in U at fixed `v`.
    pub fn iso_u(&self, v: f64) -> NurbsCurve {
        self.iso_u_from(v, Side::Right)
    }

    fn iso_u_from(&self, v: f64, side: Side) -> NurbsCurve {
        let (span, basis) = Self::contract(&self.v_knots, self.v_degree, self.n_v, v, side);
        let poles = (0..self.n_u)
            .map(|i| {
                basis.iter().enumerate().fold(Vector4::zeros(), |acc, (r, n)| {
                    let j = span - self.v_degree + r;
                    acc + self.poles[j * self.n_u + i] * *n
                })
            })
            .collect();
        NurbsCurve {
            degree: self.u_degree,
            poles,
            rational: self.rational,
            knots: self.u_knots.clone(),
        }
    }

    /// The iso-parametric curve in V at fixed `u`.
    pub fn iso_v(&self, u: f64) -> NurbsCurve {
        self.iso_v_from(u, Side::Right)
    }

    fn iso_v_from(&self, u: f64, side: Side) -> NurbsCurve {
        let (span, basis) = Self::contract(&self.u_knots, self.u_degree, self.n_u, u, side);
        let poles = (0..self.n_v)
            .map(|j| {
                basis.iter().enumerate().fold(Vector4::zeros(), |acc, (r, n)| {
                    let i = span - self.u_degree + r;
                    acc + self.poles[j * self.n_u + i] * *n
                })
            })
            .collect();
        NurbsCurve {
            degree: self.v_degree,
            poles,
            rational: self.rational,
            knots: self.v_knots.clone(),
        }
    }

    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        self.iso_u(v).point_at(u)
    }

    /// Partial derivatives `(∂S/∂u, ∂S/∂v)`.
    pub fn partials(&self, u: f64, v: f64) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.iso_u(v).derivative_at(u, Side::Right),
            self.iso_v(u).derivative_at(v, Side::Right),
        )
    }

    /// Unit normal `∂S/∂u × ∂S/∂v`, `None` where the surface is singular.
    pub fn normal_at(&self, u: f64, v: f64) -> Option<Vector3<f64>> {
        let (du, dv) = self.partials(u, v);
        let n = du.cross(&dv);
        let len = n.norm();
        (len > 1e-12).then(|| n / len)
    }

    pub fn transformed(&self, t: &Similarity) -> Self {
        Self {
            poles: self
                .poles
                .iter()
                .map(|h| transform_homogeneous(h, t))
                .collect(),
            ..self.clone()
        }
    }

    /// Whether every U iso-curve returns to its start.
    pub fn is_closed_in_u(&self, tolerance: f64) -> bool {
        let (_, v) = self.domain();
        Self::probes(v, 9).all(|v| self.iso_u(v).is_closed(tolerance))
    }

    /// Whether every V iso-curve returns to its start.
    pub fn is_closed_in_v(&self, tolerance: f64) -> bool {
        let (u, _) = self.domain();
        Self::probes(u, 9).all(|u| self.iso_v(u).is_closed(tolerance))
    }

    /// Sample parameters across a domain, used for closure and
    /// discontinuity probing.
    fn probes((a, b): (f64, f64), count: usize) -> impl Iterator<Item = f64> {
        (0..count).map(move |i| a + (b - a) * i as f64 / (count - 1) as f64)
    }

    /// Interior U and V parameters where the cross-boundary tangent jumps
    /// anywhere along the break line.
    pub fn g1_discontinuities(&self, angle_tolerance: f64) -> (Vec<f64>, Vec<f64>) {
        let ((u0, u1), (v0, v1)) = self.domain();
        let u_breaks = self
            .u_knots
            .interior_breaks(self.u_degree, self.n_u, self.u_degree)
            .into_iter()
            .filter(|&u| {
                Self::probes((v0, v1), 5).any(|v| {
                    let curve = self.iso_u_from(v, Side::Right);
                    curve.g1_discontinuities(angle_tolerance).iter().any(|&t| (t - u).abs() <= KNOT_TOLERANCE)
                })
            })
            .collect();
        let v_breaks = self
            .v_knots
            .interior_breaks(self.v_degree, self.n_v, self.v_degree)
            .into_iter()
            .filter(|&v| {
                Self::probes((u0, u1), 5).any(|u| {
                    let curve = self.iso_v_from(u, Side::Right);
                    curve.g1_discontinuities(angle_tolerance).iter().any(|&t| (t - v).abs() <= KNOT_TOLERANCE)
                })
            })
            .collect();
        (u_breaks, v_breaks)
    }
}
