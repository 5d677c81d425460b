// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Brep-Bridge Translator
//!
//! Translates one source B-rep body into a target modeling kernel.
//!
//! Target kernels of this family build a body in two phases: the whole
//! topology graph goes in as flat arrays in one call, and geometry created
//! beforehand is attached in bulk afterwards. The translator therefore
//! walks the source once, creating geometry and recording topology as it
//! goes, then hands both to the kernel.
//!
//! ## Pipeline
//!
//! 1. Normalize: fit the body into the kernel's modeling cube and derive a
//!    vertex tolerance
//! 2. Build ([`TopologyBuilder`]): traverse regions, shells, faces, loops,
//!    edges and vertices, creating geometry through the [`GeometryFactory`]
//! 3. Assemble: a single-face sheet takes the sheet-from-surface shortcut,
//!    everything else one bulk topology call
//! 4. Attach points, curves and surfaces
//! 5. Repair, then check the body
//!
//! Every failure rolls back what the conversion created.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brep_bridge_kernel::MemoryKernel;
//! use brep_bridge_translator::{convert, TranslatorConfig};
//!
//! let mut kernel = MemoryKernel::new();
//! let conversion = convert(&graph, &mut kernel, &TranslatorConfig::default())?;
//! println!("body {:?}, scale back {}", conversion.body, conversion.to_source.scale);
//! ```

pub mod assembler;
pub mod attach;
pub mod builder;
pub mod cleanup;
pub mod config;
pub mod converter;
pub mod error;
pub mod factory;
pub mod repair;

pub use builder::{BuiltTopology, TopologyBuilder};
pub use config::TranslatorConfig;
pub use converter::{convert, Conversion, Translator};
pub use error::{Error, Result};
pub use factory::{Construction, EdgeEnds, GeometryFactory};
