// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of topology tables.
//!
//! Used for diagnostic dumps only: geometry handles are rendered through
//! their `Debug` form since they are opaque kernel tags.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::{Sense, TopologyClass};
use crate::table::TopologyTable;

/// Serializable representation of a topology table.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub entries: Vec<EntrySnapshot>,
    pub relations: Vec<RelationSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub index: usize,
    pub class: TopologyClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub parent: usize,
    pub child: usize,
    pub sense: Sense,
}

impl<G: Copy + Debug> TopologyTable<G> {
    /// Creates a serializable snapshot of the table.
    pub fn to_snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            entries: self
                .classes()
                .iter()
                .zip(self.geometry())
                .enumerate()
                .map(|(index, (class, geometry))| EntrySnapshot {
                    index,
                    class: *class,
                    geometry: geometry.as_ref().map(|g| format!("{g:?}")),
                })
                .collect(),
            relations: self
                .relations()
                .map(|r| RelationSnapshot {
                    parent: r.parent,
                    child: r.child,
                    sense: r.sense,
                })
                .collect(),
        }
    }

    /// Serializes the table to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl TableSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}
