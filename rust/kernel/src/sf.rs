// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standard forms: the parameter records each geometry constructor takes.
//!
//! B-splines use the kernel's compact layout: homogeneous control vertices
//! (rational poles pre-multiplied by their weight) and distinct knots with
//! explicit multiplicities rather than the expanded knot vector.

use brep_bridge_geometry::{Frame, KnotVector, NurbsCurve, NurbsSurface};
use nalgebra::{Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointSf {
    pub position: Point3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSf {
    pub position: Point3<f64>,
    pub direction: Vector3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleSf {
    pub basis: Frame,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseSf {
    pub basis: Frame,
    pub major_radius: f64,
    pub minor_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BCurveSf {
    pub degree: usize,
    /// Homogeneous control vertices; `w == 1` when not rational.
    pub vertices: Vec<Vector4<f64>>,
    pub is_rational: bool,
    pub knots: Vec<f64>,
    pub knot_mult: Vec<usize>,
    pub is_periodic: bool,
    pub is_closed: bool,
}

impl BCurveSf {
    pub fn from_nurbs(curve: &NurbsCurve, is_periodic: bool, is_closed: bool) -> Self {
        let distinct = curve.knots().distinct();
        Self {
            degree: curve.degree(),
            vertices: curve.homogeneous_poles().to_vec(),
            is_rational: curve.is_rational(),
            knots: distinct.values,
            knot_mult: distinct.multiplicities,
            is_periodic,
            is_closed,
        }
    }

    pub fn to_nurbs(&self) -> Result<NurbsCurve> {
        let knots = KnotVector::from_distinct(&self.knots, &self.knot_mult)?;
        Ok(NurbsCurve::from_homogeneous(
            self.degree,
            self.vertices.clone(),
            self.is_rational,
            knots,
        )?)
    }
}

/// A chain of Bézier segments sharing end points.
///
/// Each segment contributes `degree + 1` coefficients; consecutive segments
/// must meet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiecewiseSf {
    pub degree: usize,
    pub coefficients: Vec<Point3<f64>>,
}

impl PiecewiseSf {
    pub fn segment_count(&self) -> usize {
        self.coefficients.len() / (self.degree + 1)
    }

    /// Joins the segments into one clamped B-spline with knots at the
    /// integers.
    pub fn to_nurbs(&self, join_tolerance: f64) -> Result<NurbsCurve> {
        let order = self.degree + 1;
        if self.degree == 0 || self.coefficients.is_empty() || self.coefficients.len() % order != 0 {
            return Err(Error::InvalidParameters(format!(
                "{} coefficients for degree {} segments",
                self.coefficients.len(),
                self.degree
            )));
        }
        let segments: Vec<&[Point3<f64>]> = self.coefficients.chunks(order).collect();
        let mut poles = segments[0].to_vec();
        for pair in segments.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let gap = (next[0] - prev[self.degree]).norm();
            if gap > join_tolerance {
                return Err(Error::InvalidParameters(format!(
                    "piecewise segments do not meet (gap {gap:e})"
                )));
            }
            poles.extend_from_slice(&next[1..]);
        }

        let n = segments.len();
        let values: Vec<f64> = (0..=n).map(|i| i as f64).collect();
        let mut mults = vec![self.degree; n + 1];
        mults[0] = order;
        mults[n] = order;
        let knots = KnotVector::from_distinct(&values, &mults)?;
        Ok(NurbsCurve::new(self.degree, poles, None, knots)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneSf {
    pub basis: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CylinderSf {
    pub basis: Frame,
    pub radius: f64,
}

/// Cone with `radius` measured in the plane through the basis origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConeSf {
    pub basis: Frame,
    pub radius: f64,
    pub semi_angle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereSf {
    pub basis: Frame,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorusSf {
    pub basis: Frame,
    pub major_radius: f64,
    pub minor_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BSurfaceSf {
    pub u_degree: usize,
    pub v_degree: usize,
    pub n_u: usize,
    pub n_v: usize,
    /// Homogeneous control net, U fastest.
    pub vertices: Vec<Vector4<f64>>,
    pub is_rational: bool,
    pub u_knots: Vec<f64>,
    pub u_knot_mult: Vec<usize>,
    pub v_knots: Vec<f64>,
    pub v_knot_mult: Vec<usize>,
    pub is_u_periodic: bool,
    pub is_v_periodic: bool,
    pub is_u_closed: bool,
    pub is_v_closed: bool,
}

impl BSurfaceSf {
    /// Flags are given as `(u, v)` pairs.
    pub fn from_nurbs(
        surface: &NurbsSurface,
        is_periodic: (bool, bool),
        is_closed: (bool, bool),
    ) -> Self {
        let (u_degree, v_degree) = surface.degrees();
        let (n_u, n_v) = surface.net_size();
        let u = surface.u_knots().distinct();
        let v = surface.v_knots().distinct();
        Self {
            u_degree,
            v_degree,
            n_u,
            n_v,
            vertices: surface.homogeneous_poles().to_vec(),
            is_rational: surface.is_rational(),
            u_knots: u.values,
            u_knot_mult: u.multiplicities,
            v_knots: v.values,
            v_knot_mult: v.multiplicities,
            is_u_periodic: is_periodic.0,
            is_v_periodic: is_periodic.1,
            is_u_closed: is_closed.0,
            is_v_closed: is_closed.1,
        }
    }

    pub fn to_nurbs(&self) -> Result<NurbsSurface> {
        let u_knots = KnotVector::from_distinct(&self.u_knots, &self.u_knot_mult)?;
        let v_knots = KnotVector::from_distinct(&self.v_knots, &self.v_knot_mult)?;
        Ok(NurbsSurface::from_homogeneous(
            self.u_degree,
            self.v_degree,
            self.n_u,
            self.n_v,
            self.vertices.clone(),
            self.is_rational,
            u_knots,
            v_knots,
        )?)
    }
}
