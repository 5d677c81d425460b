// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stable handles for source entities.

use std::fmt;

/// Identity of a source topological entity.
///
/// Two traversal visits of the same shared edge or vertex yield the same
/// handle; it names the underlying object, never the traversal cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityHandle(pub u64);

impl EntityHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for EntityHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
