// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology class tags and relation senses.
//!
//! Bulk topology constructors take a flat array of class tags and a list of
//! `(parent, child, sense)` relations. These are the two vocabularies.

use serde::{Deserialize, Serialize};

/// Discriminant for topology entity classes, in containment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TopologyClass {
    Body = 0,
    Region = 1,
    Shell = 2,
    Face = 3,
    Loop = 4,
    Edge = 5,
    Vertex = 6,
}

impl TopologyClass {
    /// Number of classes.
    pub const COUNT: usize = 7;

    pub const ALL: [TopologyClass; Self::COUNT] = [
        TopologyClass::Body,
        TopologyClass::Region,
        TopologyClass::Shell,
        TopologyClass::Face,
        TopologyClass::Loop,
        TopologyClass::Edge,
        TopologyClass::Vertex,
    ];

    /// Returns the class name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyClass::Body => "Body",
            TopologyClass::Region => "Region",
            TopologyClass::Shell => "Shell",
            TopologyClass::Face => "Face",
            TopologyClass::Loop => "Loop",
            TopologyClass::Edge => "Edge",
            TopologyClass::Vertex => "Vertex",
        }
    }

    /// Faces, edges and vertices carry geometry; the rest are purely
    /// topological.
    pub fn carries_geometry(&self) -> bool {
        matches!(
            self,
            TopologyClass::Face | TopologyClass::Edge | TopologyClass::Vertex
        )
    }

    /// Whether `child` may appear directly below `self`.
    pub fn admits_child(&self, child: TopologyClass) -> bool {
        use TopologyClass::*;
        matches!(
            (self, child),
            (Body, Region)
                | (Region, Shell)
                | (Shell, Face)
                | (Face, Loop)
                | (Loop, Edge)
                | (Loop, Vertex)
                | (Edge, Vertex)
        )
    }

    pub(crate) fn slot(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for TopologyClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign of a parent→child relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sense {
    Positive,
    Negative,
    #[default]
    None,
}

impl Sense {
    /// `+` for true, `-` for false.
    pub fn from_orientation(oriented: bool) -> Self {
        if oriented {
            Sense::Positive
        } else {
            Sense::Negative
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Sense::Positive => '+',
            Sense::Negative => '-',
            Sense::None => ' ',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names() {
        assert_eq!(TopologyClass::Body.as_str(), "Body");
        assert_eq!(TopologyClass::Loop.to_string(), "Loop");
        assert_eq!(TopologyClass::ALL.len(), TopologyClass::COUNT);
    }

    #[test]
    fn class_ordering_follows_containment() {
        for pair in TopologyClass::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn only_faces_edges_vertices_carry_geometry() {
        let carrying: Vec<_> = TopologyClass::ALL
            .iter()
            .filter(|c| c.carries_geometry())
            .collect();
        assert_eq!(
            carrying,
            vec![&TopologyClass::Face, &TopologyClass::Edge, &TopologyClass::Vertex]
        );
    }

    #[test]
    fn loops_admit_singular_vertices() {
        assert!(TopologyClass::Loop.admits_child(TopologyClass::Vertex));
        assert!(TopologyClass::Edge.admits_child(TopologyClass::Vertex));
        assert!(!TopologyClass::Face.admits_child(TopologyClass::Edge));
        assert!(!TopologyClass::Region.admits_child(TopologyClass::Region));
    }

    #[test]
    fn sense_from_orientation() {
        assert_eq!(Sense::from_orientation(true), Sense::Positive);
        assert_eq!(Sense::from_orientation(false), Sense::Negative);
        assert_eq!(Sense::default(), Sense::None);
    }
}
