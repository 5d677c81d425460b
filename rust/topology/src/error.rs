// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology table operations.

use crate::keys::TopologyClass;

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reading topology tables.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A relation refers to an entry that does not exist.
    #[error("topology index {index} out of range (table has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The parallel relation arrays have drifted apart.
    #[error("relation arrays out of sync: {parents} parents, {children} children, {senses} senses")]
    RelationMismatch {
        parents: usize,
        children: usize,
        senses: usize,
    },

    /// The class and geometry arrays have drifted apart.
    #[error("table arrays out of sync: {classes} classes, {geometry} geometry slots")]
    GeometryMismatch { classes: usize, geometry: usize },

    /// Nothing was added to the table.
    #[error("topology table is empty")]
    Empty,

    /// Entries exist but no relation connects them.
    #[error("topology table has no relations")]
    NoRelations,

    /// A parent/child pair is not a valid containment.
    #[error("{parent} cannot contain {child}")]
    InvalidContainment {
        parent: TopologyClass,
        child: TopologyClass,
    },

    /// An orientation entry was never recorded for this entity.
    #[error("no orientation recorded for {class} {index}")]
    MissingOrientation { class: TopologyClass, index: usize },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
