// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Knot vectors.
//!
//! Source data arrives with the full, multiplicity-expanded knot sequence.
//! Kernels that accept B-splines usually want the compact form instead:
//! the list of distinct knot values plus an integer multiplicity for each.
//! [`KnotVector`] stores the expanded form and converts both ways.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Two knots closer than this are the same knot.
pub const KNOT_TOLERANCE: f64 = 1e-10;

/// Side from which a parameter on a knot is approached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Distinct knot values with multiplicities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistinctKnots {
    pub values: Vec<f64>,
    pub multiplicities: Vec<usize>,
}

impl DistinctKnots {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of multiplicities, the length of the expanded vector.
    pub fn total(&self) -> usize {
        self.multiplicities.iter().sum()
    }
}

/// A non-decreasing, multiplicity-expanded knot sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnotVector {
    knots: Vec<f64>,
}

impl KnotVector {
    pub fn new(knots: Vec<f64>) -> Result<Self> {
        if knots.len() < 2 {
            return Err(Error::InvalidKnots(format!(
                "need at least 2 knots, got {}",
                knots.len()
            )));
        }
        if knots.iter().any(|k| !k.is_finite()) {
            return Err(Error::InvalidKnots("non-finite knot".into()));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(Error::InvalidKnots("knots are not non-decreasing".into()));
        }
        Ok(Self { knots })
    }

    /// Expand distinct knots by their multiplicities.
    pub fn from_distinct(values: &[f64], multiplicities: &[usize]) -> Result<Self> {
        if values.len() != multiplicities.len() {
            return Err(Error::InvalidKnots(format!(
                "{} knot values but {} multiplicities",
                values.len(),
                multiplicities.len()
            )));
        }
        let mut expanded = Vec::with_capacity(multiplicities.iter().sum());
        for (&knot, &mult) in values.iter().zip(multiplicities) {
            if mult == 0 {
                return Err(Error::InvalidKnots(format!("zero multiplicity at {knot}")));
            }
            expanded.extend(std::iter::repeat(knot).take(mult));
        }
        Self::new(expanded)
    }

    /// Clamped uniform knots on `[0, 1]` for `n_points` control points.
    pub fn clamped_uniform(n_points: usize, degree: usize) -> Result<Self> {
        if n_points <= degree {
            return Err(Error::InvalidKnots(format!(
                "{n_points} control points cannot carry degree {degree}"
            )));
        }
        let spans = n_points - degree;
        let mut knots = vec![0.0; degree + 1];
        knots.extend((1..spans).map(|i| i as f64 / spans as f64));
        knots.extend(std::iter::repeat(1.0).take(degree + 1));
        Self::new(knots)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.knots
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Collapse to distinct values and multiplicities.
    pub fn distinct(&self) -> DistinctKnots {
        let mut values: Vec<f64> = Vec::new();
        let mut multiplicities: Vec<usize> = Vec::new();
        for &k in &self.knots {
            match values.last() {
                Some(&last) if (k - last).abs() <= KNOT_TOLERANCE => {
                    if let Some(m) = multiplicities.last_mut() {
                        *m += 1;
                    }
                }
                _ => {
                    values.push(k);
                    multiplicities.push(1);
                }
            }
        }
        DistinctKnots {
            values,
            multiplicities,
        }
    }

    /// Multiplicity of the knot at `value`, zero when absent.
    pub fn multiplicity_at(&self, value: f64) -> usize {
        self.knots
            .iter()
            .filter(|k| (*k - value).abs() <= KNOT_TOLERANCE)
            .count()
    }

    /// Valid parameter range `[k[p], k[n]]` for a curve of `degree` with
    /// `n_points` control points.
    pub fn domain(&self, degree: usize, n_points: usize) -> (f64, f64) {
        (self.knots[degree], self.knots[n_points])
    }

    /// Check that the vector fits `n_points` control points of `degree`.
    pub fn validate(&self, degree: usize, n_points: usize) -> Result<()> {
        if degree == 0 {
            return Err(Error::InvalidKnots("degree must be at least 1".into()));
        }
        if n_points <= degree {
            return Err(Error::InvalidKnots(format!(
                "{n_points} control points cannot carry degree {degree}"
            )));
        }
        if self.knots.len() != n_points + degree + 1 {
            return Err(Error::InvalidKnots(format!(
                "expected {} knots for {} points of degree {}, got {}",
                n_points + degree + 1,
                n_points,
                degree,
                self.knots.len()
            )));
        }
        let (a, b) = self.domain(degree, n_points);
        if b - a <= KNOT_TOLERANCE {
            return Err(Error::InvalidKnots("empty parameter domain".into()));
        }
        Ok(())
    }

    /// Interior distinct knots (strictly inside the domain) whose
    /// multiplicity is at least `min_multiplicity`.
    pub fn interior_breaks(
        &self,
        degree: usize,
        n_points: usize,
        min_multiplicity: usize,
    ) -> Vec<f64> {
        let (a, b) = self.domain(degree, n_points);
        let distinct = self.distinct();
        distinct
            .values
            .iter()
            .zip(&distinct.multiplicities)
            .filter(|(&k, &m)| k > a + KNOT_TOLERANCE && k < b - KNOT_TOLERANCE && m >= min_multiplicity)
            .map(|(&k, _)| k)
            .collect()
    }

    /// Knot span index `i` with `k[i] <= t < k[i+1]` (or `k[i] < t <= k[i+1]`
    /// for [`Side::Left`]), clamped to the valid spans.
    pub fn find_span(&self, degree: usize, n_points: usize, t: f64, side: Side) -> usize {
        let n = n_points - 1;
        let k = &self.knots;
        if t >= k[n + 1] {
            return n;
        }
        if t <= k[degree] {
            return degree;
        }
        let mut low = degree;
        let mut high = n + 1;
        // Invariant: k[low] <= t < k[high] for Right, k[low] < t <= k[high] for Left.
        while high - low > 1 {
            let mid = (low + high) / 2;
            let go_right = match side {
                Side::Right => t >= k[mid],
                Side::Left => t > k[mid],
            };
            if go_right {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// The knot vector of the reversed parameterization `t -> a + b - t`.
    pub fn reversed(&self) -> Self {
        let first = self.knots[0];
        let last = self.knots[self.knots.len() - 1];
        Self {
            knots: self.knots.iter().rev().map(|k| first + last - k).collect(),
        }
    }

    /// Knots of the derivative curve: drop the first and last entry.
    pub(crate) fn derivative(&self) -> Self {
        Self {
            knots: self.knots[1..self.knots.len() - 1].to_vec(),
        }
    }
}
