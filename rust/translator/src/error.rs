// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for B-rep translation.

use thiserror::Error;

/// Result type for translation
pub type Result<T> = std::result::Result<T, Error>;

/// Why a translation failed.
///
/// [`Error::RepairFailed`] is only ever logged; a body whose repair steps
/// fail is still returned when it passes the final check.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("missing geometry: {0}")]
    MissingGeometry(String),

    #[error("unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("malformed topology: {0}")]
    MalformedTopology(String),

    #[error("kernel rejected {stage}: {reason}")]
    KernelRejected { stage: &'static str, reason: String },

    #[error("unsupported body kind: {0}")]
    UnsupportedBodyKind(String),

    #[error("repair failed: {0}")]
    RepairFailed(String),

    #[error("source error: {0}")]
    Source(#[from] brep_bridge_core::Error),

    #[error("kernel error: {0}")]
    Kernel(#[from] brep_bridge_kernel::Error),

    #[error("geometry error: {0}")]
    Geometry(#[from] brep_bridge_geometry::Error),

    #[error("topology error: {0}")]
    Topology(#[from] brep_bridge_topology::Error),
}

impl Error {
    /// Wraps a kernel error raised by a bulk call at `stage`.
    pub fn rejected(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Error::KernelRejected {
            stage,
            reason: err.to_string(),
        }
    }
}
