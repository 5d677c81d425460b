// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for kernel calls.

use thiserror::Error;

use crate::memory::Stage;
use crate::tag::{EntityTag, GeometryClass};

/// Result type for kernel calls
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a target kernel reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid creation parameters: {0}")]
    InvalidParameters(String),

    #[error("basis vectors are not orthogonal")]
    VectorsNotOrthogonal,

    #[error("{0:?} has no bounded parameter range")]
    Unbounded(GeometryClass),

    #[error("geometry lies outside the modeling size box")]
    OutsideSizeBox,

    #[error("entity {0:?} does not exist")]
    UnknownTag(EntityTag),

    #[error("entity {tag:?} is not a {expected}")]
    WrongClass {
        tag: EntityTag,
        expected: &'static str,
    },

    #[error("entity {0:?} is already attached to topology")]
    EntityInUse(EntityTag),

    #[error("curve {0:?} is not G1 continuous")]
    NotG1Continuous(EntityTag),

    #[error("closed curve {0:?} is not periodic")]
    ClosedNotPeriodic(EntityTag),

    #[error("topology rejected: {0}")]
    TopologyRejected(String),

    #[error("attach rejected: {0}")]
    AttachRejected(String),

    #[error("edge {edge:?} deviates by {deviation} (limit {limit})")]
    ToleranceExceeded {
        edge: EntityTag,
        deviation: f64,
        limit: f64,
    },

    #[error("fit failed: {0}")]
    FitFailed(String),

    #[error("injected failure at {0:?}")]
    Injected(Stage),

    #[error("geometry error: {0}")]
    Geometry(#[from] brep_bridge_geometry::Error),

    #[error("topology error: {0}")]
    Topology(#[from] brep_bridge_topology::Error),
}
