// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The flat topology table handed to bulk topology constructors.
//!
//! Entries are index-aligned: entry `i` has a class tag `classes[i]` and a
//! geometry slot `geometry[i]` (filled only for faces, edges and vertices).
//! Relations are stored as three parallel arrays (parents, children,
//! senses), which is the exact shape a bulk constructor consumes.
//!
//! The geometry handle type `G` is whatever the target kernel uses to name
//! a point, curve or surface.

use crate::error::{Error, Result};
use crate::keys::{Sense, TopologyClass};

/// One parent→child relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub parent: usize,
    pub child: usize,
    pub sense: Sense,
}

/// Index-aligned class, geometry and relation arrays.
#[derive(Debug, Clone)]
pub struct TopologyTable<G> {
    classes: Vec<TopologyClass>,
    geometry: Vec<Option<G>>,
    parents: Vec<usize>,
    children: Vec<usize>,
    senses: Vec<Sense>,
}

impl<G> Default for TopologyTable<G> {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            geometry: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            senses: Vec::new(),
        }
    }
}

impl<G: Copy> TopologyTable<G> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry and relation.
    pub fn clear(&mut self) {
        self.classes.clear();
        self.geometry.clear();
        self.parents.clear();
        self.children.clear();
        self.senses.clear();
    }

    /// Append an entry and return its index.
    pub fn push(&mut self, class: TopologyClass, geometry: Option<G>) -> usize {
        self.classes.push(class);
        self.geometry.push(geometry);
        self.classes.len() - 1
    }

    /// Record a parent→child relation. Both indices must already exist.
    pub fn add_relation(&mut self, parent: usize, child: usize, sense: Sense) -> Result<()> {
        let len = self.classes.len();
        for index in [parent, child] {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
        }
        self.parents.push(parent);
        self.children.push(child);
        self.senses.push(sense);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn relation_count(&self) -> usize {
        self.parents.len()
    }

    pub fn classes(&self) -> &[TopologyClass] {
        &self.classes
    }

    pub fn class_at(&self, index: usize) -> Option<TopologyClass> {
        self.classes.get(index).copied()
    }

    /// The geometry table, aligned with [`Self::classes`].
    pub fn geometry(&self) -> &[Option<G>] {
        &self.geometry
    }

    pub fn geometry_at(&self, index: usize) -> Option<G> {
        self.geometry.get(index).copied().flatten()
    }

    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn senses(&self) -> &[Sense] {
        &self.senses
    }

    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.parents
            .iter()
            .zip(&self.children)
            .zip(&self.senses)
            .map(|((&parent, &child), &sense)| Relation {
                parent,
                child,
                sense,
            })
    }

    /// Relations whose parent is `parent`, in insertion order.
    pub fn relations_of(&self, parent: usize) -> impl Iterator<Item = Relation> + '_ {
        self.relations().filter(move |r| r.parent == parent)
    }

    /// Number of entries of `class`.
    pub fn count(&self, class: TopologyClass) -> usize {
        self.classes.iter().filter(|c| **c == class).count()
    }

    /// Indices of entries of `class`.
    pub fn indices_of(&self, class: TopologyClass) -> impl Iterator<Item = usize> + '_ {
        self.classes
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == class)
            .map(|(i, _)| i)
    }

    /// Every geometry handle present in the table.
    pub fn geometry_handles(&self) -> impl Iterator<Item = G> + '_ {
        self.geometry.iter().filter_map(|g| *g)
    }

    /// Check the table is fit for a bulk constructor: non-empty, connected
    /// by at least one relation, aligned arrays, indices in range and every
    /// relation a legal containment.
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(Error::Empty);
        }
        if self.geometry.len() != self.classes.len() {
            return Err(Error::GeometryMismatch {
                classes: self.classes.len(),
                geometry: self.geometry.len(),
            });
        }
        if self.parents.len() != self.children.len() || self.parents.len() != self.senses.len() {
            return Err(Error::RelationMismatch {
                parents: self.parents.len(),
                children: self.children.len(),
                senses: self.senses.len(),
            });
        }
        if self.parents.is_empty() {
            return Err(Error::NoRelations);
        }
        let len = self.classes.len();
        for r in self.relations() {
            for index in [r.parent, r.child] {
                if index >= len {
                    return Err(Error::IndexOutOfRange { index, len });
                }
            }
            let (parent, child) = (self.classes[r.parent], self.classes[r.child]);
            if !parent.admits_child(child) {
                return Err(Error::InvalidContainment { parent, child });
            }
        }
        Ok(())
    }
}
