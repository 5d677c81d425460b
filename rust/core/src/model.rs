// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classification types shared by every source B-rep provider.

use crate::handle::EntityHandle;

/// Volume below which a generic body counts as a sheet.
pub const SHEET_VOLUME_TOLERANCE: f64 = 1e-10;

/// What kind of entity the source body came from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BodyKind {
    /// A closed solid.
    Solid,
    /// A standalone surface entity.
    Surface,
    /// A planar region entity.
    Region,
    /// A generic body; sheet-ness is decided by its enclosed volume.
    Generic { volume: Option<f64> },
}

impl BodyKind {
    /// Whether the body encloses no volume.
    ///
    /// Solids never are; surfaces and regions always are; a generic body is
    /// a sheet when its volume is unknown or below
    /// [`SHEET_VOLUME_TOLERANCE`].
    pub fn is_sheet(&self) -> bool {
        match self {
            BodyKind::Solid => false,
            BodyKind::Surface | BodyKind::Region => true,
            BodyKind::Generic { volume } => match volume {
                Some(v) => *v < SHEET_VOLUME_TOLERANCE,
                None => true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ShellType {
    Exterior,
    Interior,
    Unclassified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoopType {
    Exterior,
    Interior,
    Winding,
    Unclassified,
}

/// One edge use inside a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoopEdge {
    pub edge: EntityHandle,
    /// Whether the loop runs along the edge's vertex1→vertex2 direction.
    pub orient_to_loop: bool,
}

impl LoopEdge {
    pub fn new(edge: EntityHandle, orient_to_loop: bool) -> Self {
        Self {
            edge,
            orient_to_loop,
        }
    }
}

/// Outcome of descending into an entity's children.
///
/// Some B-rep shapes have no children at a level where children are
/// normally expected: a full sphere face has no loops, a cone apex loop has
/// no edges. These are tagged outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Descent<T> {
    Entered(T),
    /// The entity is intrinsically bounded (face) or a singular point (loop).
    Degenerate,
}

impl<T> Descent<T> {
    pub fn is_degenerate(&self) -> bool {
        matches!(self, Descent::Degenerate)
    }

    pub fn entered(self) -> Option<T> {
        match self {
            Descent::Entered(t) => Some(t),
            Descent::Degenerate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_classification() {
        assert!(!BodyKind::Solid.is_sheet());
        assert!(BodyKind::Surface.is_sheet());
        assert!(BodyKind::Region.is_sheet());
        assert!(BodyKind::Generic { volume: None }.is_sheet());
        assert!(BodyKind::Generic { volume: Some(0.0) }.is_sheet());
        assert!(!BodyKind::Generic { volume: Some(8.0) }.is_sheet());
    }

    #[test]
    fn descent_unwraps() {
        assert_eq!(Descent::Entered(3).entered(), Some(3));
        assert!(Descent::<u8>::Degenerate.is_degenerate());
        assert_eq!(Descent::<u8>::Degenerate.entered(), None);
    }
}
