// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Brep-Bridge Geometry
//!
//! The numeric side of B-rep translation:
//!
//! - **Frames**: origin + axis + reference direction placements for analytic
//!   curves and surfaces
//! - **Knots**: expanded knot vectors and their distinct/multiplicity form
//! - **NURBS**: rational B-spline curves and surfaces with homogeneous
//!   control points, derivatives and G1/C1 discontinuity detection
//! - **Fitting**: tangent-continuous cubic refits of curves and surfaces
//! - **Normalization**: fitting a body into a bounded modeling cube
//!
//! Everything here is pure math on [`nalgebra`] types and holds no kernel
//! state.

pub mod error;
pub mod fit;
pub mod frame;
pub mod knots;
pub mod normalize;
pub mod nurbs;
pub mod transform;

pub use error::{Error, Result};
pub use frame::Frame;
pub use knots::{DistinctKnots, KnotVector, Side};
pub use normalize::{normalize, Extents, Normalization, NormalizerSettings};
pub use nurbs::{NurbsCurve, NurbsSurface, C1_RELATIVE_TOLERANCE, G1_ANGLE_TOLERANCE};
pub use transform::Similarity;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3, Vector4};
