// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for geometry operations.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Body extents collapse to a point.
    #[error("degenerate extents: body size {0:e} is too small to normalize")]
    DegenerateExtents(f64),

    /// Placement axes are zero-length or parallel.
    #[error("degenerate frame: {0}")]
    DegenerateFrame(String),

    #[error("invalid knot vector: {0}")]
    InvalidKnots(String),

    #[error("invalid control net: {0}")]
    InvalidControlNet(String),

    #[error("curve fitting failed: {0}")]
    FitFailed(String),
}
