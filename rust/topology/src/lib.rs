// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Brep-Bridge Topology
//!
//! Bookkeeping for two-phase B-rep construction, where a target kernel
//! wants the complete topology graph up front as flat arrays and geometry
//! attached afterwards.
//!
//! - [`TopologyTable`]: index-aligned class tags, geometry slots and
//!   `(parent, child, sense)` relations
//! - [`TopologyCache`]: per-class identity maps so shared edges and
//!   vertices get exactly one entry
//! - [`OrientationMaps`]: face→surface and edge→curve bits consulted at
//!   attach time
//!
//! The crate is generic over both the source handle type and the target
//! geometry handle type; it never talks to a kernel itself.

pub mod cache;
pub mod error;
pub mod keys;
pub mod orientation;
pub mod serialization;
pub mod table;

pub use cache::TopologyCache;
pub use error::{Error, Result};
pub use keys::{Sense, TopologyClass};
pub use orientation::OrientationMaps;
pub use serialization::TableSnapshot;
pub use table::{Relation, TopologyTable};
