// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face→surface and edge→curve orientation bits, keyed by table index.
//!
//! Written when an entity is discovered (after geometry construction has
//! had a chance to flip the bit), read when geometry is attached.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::keys::TopologyClass;

#[derive(Debug, Clone, Default)]
pub struct OrientationMaps {
    face_to_surface: FxHashMap<usize, bool>,
    edge_to_curve: FxHashMap<usize, bool>,
}

impl OrientationMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.face_to_surface.clear();
        self.edge_to_curve.clear();
    }

    /// Record (or overwrite) the face→surface bit.
    pub fn set_face(&mut self, face: usize, oriented: bool) {
        self.face_to_surface.insert(face, oriented);
    }

    /// Record the edge→curve bit. The first sighting of an edge wins; later
    /// sightings through other loops report the same underlying edge.
    pub fn set_edge(&mut self, edge: usize, oriented: bool) {
        self.edge_to_curve.entry(edge).or_insert(oriented);
    }

    pub fn face(&self, face: usize) -> Result<bool> {
        self.face_to_surface
            .get(&face)
            .copied()
            .ok_or(Error::MissingOrientation {
                class: TopologyClass::Face,
                index: face,
            })
    }

    pub fn edge(&self, edge: usize) -> Result<bool> {
        self.edge_to_curve
            .get(&edge)
            .copied()
            .ok_or(Error::MissingOrientation {
                class: TopologyClass::Edge,
                index: edge,
            })
    }

    pub fn face_count(&self) -> usize {
        self.face_to_surface.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to_curve.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_entry_is_an_error() {
        let maps = OrientationMaps::new();
        assert_eq!(
            maps.face(4),
            Err(Error::MissingOrientation {
                class: TopologyClass::Face,
                index: 4
            })
        );
        assert!(maps.edge(0).is_err());
    }

    #[test]
    fn face_bit_can_be_overwritten() {
        let mut maps = OrientationMaps::new();
        maps.set_face(3, true);
        maps.set_face(3, false);
        assert_eq!(maps.face(3), Ok(false));
        assert_eq!(maps.face_count(), 1);
    }

    #[test]
    fn first_edge_sighting_wins() {
        let mut maps = OrientationMaps::new();
        maps.set_edge(8, false);
        maps.set_edge(8, true);
        assert_eq!(maps.edge(8), Ok(false));
    }
}
