// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smooth refitting of curves and surfaces.
//!
//! A refit samples the input over a parameter range and interpolates the
//! samples with a cubic Hermite spline whose tangents are Catmull-Rom
//! estimates. Each Hermite segment becomes one Bézier piece of a cubic
//! B-spline with triple interior knots; adjacent pieces share a point and
//! collinear neighbors, so the result is tangent-continuous by
//! construction. Surfaces apply the same scheme along U, then along V.

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::knots::{KnotVector, KNOT_TOLERANCE};
use crate::nurbs::{NurbsCurve, NurbsSurface};

/// Samples taken per knot span of the input.
pub const DEFAULT_SAMPLES_PER_SPAN: usize = 4;

/// Degree of every fitted spline.
pub const FIT_DEGREE: usize = 3;

/// Sample parameters: every distinct knot inside `[a, b]`, each span
/// subdivided into `per_span` steps.
pub fn sample_parameters(knots: &KnotVector, (a, b): (f64, f64), per_span: usize) -> Vec<f64> {
    let per_span = per_span.max(1);
    let mut breaks: Vec<f64> = vec![a];
    breaks.extend(
        knots
            .distinct()
            .values
            .into_iter()
            .filter(|&k| k > a + KNOT_TOLERANCE && k < b - KNOT_TOLERANCE),
    );
    breaks.push(b);

    let mut params = Vec::with_capacity((breaks.len() - 1) * per_span + 1);
    for w in breaks.windows(2) {
        for s in 0..per_span {
            params.push(w[0] + (w[1] - w[0]) * s as f64 / per_span as f64);
        }
    }
    params.push(b);
    params
}

/// Cubic Bézier-form control points and knots interpolating `points` at
/// `params` with Catmull-Rom tangents.
pub fn hermite_controls(
    params: &[f64],
    points: &[Vector3<f64>],
) -> Result<(Vec<Vector3<f64>>, KnotVector)> {
    let n = points.len();
    if n < 2 || params.len() != n {
        return Err(Error::FitFailed(format!(
            "need matching samples, got {} points and {} parameters",
            n,
            params.len()
        )));
    }
    if params.windows(2).any(|w| w[1] - w[0] <= KNOT_TOLERANCE) {
        return Err(Error::FitFailed("sample parameters are not increasing".into()));
    }

    let tangent = |i: usize| -> Vector3<f64> {
        let (lo, hi) = match i {
            0 => (0, 1),
            i if i == n - 1 => (n - 2, n - 1),
            i => (i - 1, i + 1),
        };
        (points[hi] - points[lo]) / (params[hi] - params[lo])
    };

    let mut controls = Vec::with_capacity(3 * (n - 1) + 1);
    controls.push(points[0]);
    for i in 0..n - 1 {
        let h = params[i + 1] - params[i];
        controls.push(points[i] + tangent(i) * (h / 3.0));
        controls.push(points[i + 1] - tangent(i + 1) * (h / 3.0));
        controls.push(points[i + 1]);
    }

    let mut multiplicities = vec![FIT_DEGREE; n];
    multiplicities[0] = FIT_DEGREE + 1;
    multiplicities[n - 1] = FIT_DEGREE + 1;
    let knots = KnotVector::from_distinct(params, &multiplicities)?;
    Ok((controls, knots))
}

/// Refit `curve` over `range` as a smooth non-rational cubic.
pub fn fit_curve(curve: &NurbsCurve, range: (f64, f64), per_span: usize) -> Result<NurbsCurve> {
    if range.1 - range.0 <= KNOT_TOLERANCE {
        return Err(Error::FitFailed("empty fitting interval".into()));
    }
    let params = sample_parameters(curve.knots(), range, per_span);
    let points: Vec<Vector3<f64>> = params.iter().map(|&t| curve.point_at(t).coords).collect();
    let (controls, knots) = hermite_controls(&params, &points)?;
    NurbsCurve::new(
        FIT_DEGREE,
        controls.into_iter().map(Point3::from).collect(),
        None,
        knots,
    )
}

/// Refit `surface` over a UV box as a smooth non-rational bicubic.
pub fn fit_surface(
    surface: &NurbsSurface,
    (u_range, v_range): ((f64, f64), (f64, f64)),
    per_span: usize,
) -> Result<NurbsSurface> {
    if u_range.1 - u_range.0 <= KNOT_TOLERANCE || v_range.1 - v_range.0 <= KNOT_TOLERANCE {
        return Err(Error::FitFailed("empty fitting box".into()));
    }
    let us = sample_parameters(surface.u_knots(), u_range, per_span);
    let vs = sample_parameters(surface.v_knots(), v_range, per_span);

    // Fit each sampled row along U.
    let mut rows = Vec::with_capacity(vs.len());
    let mut u_knots = None;
    for &v in &vs {
        let iso = surface.iso_u(v);
        let samples: Vec<Vector3<f64>> = us.iter().map(|&u| iso.point_at(u).coords).collect();
        let (controls, knots) = hermite_controls(&us, &samples)?;
        rows.push(controls);
        u_knots = Some(knots);
    }
    let u_knots = u_knots.ok_or_else(|| Error::FitFailed("no rows sampled".into()))?;
    let n_u = rows[0].len();

    // Then each control column along V.
    let mut columns = Vec::with_capacity(n_u);
    let mut v_knots = None;
    for c in 0..n_u {
        let column: Vec<Vector3<f64>> = rows.iter().map(|row| row[c]).collect();
        let (controls, knots) = hermite_controls(&vs, &column)?;
        columns.push(controls);
        v_knots = Some(knots);
    }
    let v_knots = v_knots.ok_or_else(|| Error::FitFailed("no columns sampled".into()))?;
    let n_v = columns[0].len();

    let mut net = Vec::with_capacity(n_u * n_v);
    for j in 0..n_v {
        for column in &columns {
            net.push(Point3::from(column[j]));
        }
    }
    NurbsSurface::new(
        FIT_DEGREE,
        FIT_DEGREE,
        n_u,
        n_v,
        net,
        None,
        u_knots,
        v_knots,
    )
}
