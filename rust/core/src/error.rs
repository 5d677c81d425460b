// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for source model access.

use thiserror::Error;

use crate::handle::EntityHandle;

/// Result type for source model queries
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading a source B-rep.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unknown source entity {0}")]
    UnknownEntity(EntityHandle),

    #[error("source entity {handle} is not a {expected}")]
    WrongKind {
        handle: EntityHandle,
        expected: &'static str,
    },

    #[error("source body has no measurable extents")]
    NoExtents,

    #[error("geometry error: {0}")]
    Geometry(#[from] brep_bridge_geometry::Error),
}
