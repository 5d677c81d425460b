// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Brep-Bridge Kernel
//!
//! The target side of a B-rep translation.
//!
//! - [`TargetKernel`]: the calls a translator makes, from creating
//!   geometry through the standard forms in [`sf`] to bulk topology
//!   creation, attach, repair and checking
//! - [`FaultReport`] and [`CheckFault`]: typed readings of the fault
//!   records bulk calls return
//! - [`MemoryKernel`]: an in-memory implementation with per-stage failure
//!   injection
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brep_bridge_kernel::{MemoryKernel, TargetKernel, sf::PointSf};
//!
//! let mut kernel = MemoryKernel::new();
//! let point = kernel.create_point(&PointSf { position: Point3::origin() })?;
//! assert!(kernel.is_live(point));
//! ```

pub mod error;
pub mod fault;
pub mod kernel;
pub mod memory;
pub mod sf;
pub mod tag;

pub use error::{Error, Result};
pub use fault::{CheckFault, CheckState, FaultReport, FaultState, TopolFault};
pub use kernel::{CreatedTopology, TargetKernel, TopologyRequest, UvBox};
pub use memory::{Geom, MemoryKernel, Stage, SIZE_BOX_HALF};
pub use tag::{BodyType, EntityTag, GeometryClass};
