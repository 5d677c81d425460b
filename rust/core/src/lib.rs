// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Brep-Bridge Core
//!
//! The source side of a B-rep translation: how a modeler's body is walked
//! and what geometry it carries.
//!
//! - [`BrepTraversal`]: body → region → shell → face → loop → edge →
//!   vertex, with degenerate faces and singular loops reported as
//!   [`Descent::Degenerate`] rather than errors
//! - [`GeometryQuery`]: [`SourceCurve`] and [`SourceSurface`] per edge/face
//! - [`BrepGraph`]: an in-memory body implementing both
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brep_bridge_core::{BodyKind, BrepGraph, BrepTraversal};
//!
//! let mut graph = BrepGraph::new(BodyKind::Solid);
//! let v = graph.add_vertex(Point3::origin());
//! // ... edges, loops, faces, shells, regions
//! let extents = graph.extents()?;
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization of source geometry and classifications

pub mod curve;
pub mod error;
pub mod graph;
pub mod handle;
pub mod model;
pub mod surface;
pub mod traversal;

pub use curve::SourceCurve;
pub use error::{Error, Result};
pub use graph::BrepGraph;
pub use handle::EntityHandle;
pub use model::{BodyKind, Descent, LoopEdge, LoopType, ShellType, SHEET_VOLUME_TOLERANCE};
pub use surface::SourceSurface;
pub use traversal::{BrepTraversal, GeometryQuery};
