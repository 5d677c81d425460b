// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity cache from source entities to table indices.
//!
//! A B-rep is a DAG: an edge is reached once per loop that uses it and a
//! vertex once per edge. The cache keeps one map per [`TopologyClass`],
//! keyed by the source entity's stable handle, so every source entity gets
//! exactly one table entry no matter how often traversal reaches it.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::keys::TopologyClass;
use crate::table::TopologyTable;

/// Per-class maps from source handle to table index.
#[derive(Debug, Clone)]
pub struct TopologyCache<K> {
    maps: [FxHashMap<K, usize>; TopologyClass::COUNT],
}

impl<K> Default for TopologyCache<K> {
    fn default() -> Self {
        Self {
            maps: std::array::from_fn(|_| FxHashMap::default()),
        }
    }
}

impl<K: Hash + Eq + Copy> TopologyCache<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        for map in &mut self.maps {
            map.clear();
        }
    }

    /// Index already assigned to `key`, if any.
    pub fn lookup(&self, class: TopologyClass, key: K) -> Option<usize> {
        self.maps[class.slot()].get(&key).copied()
    }

    /// Number of distinct entities seen for `class`.
    pub fn len(&self, class: TopologyClass) -> usize {
        self.maps[class.slot()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(|m| m.is_empty())
    }

    /// Return the index for `key`, adding a table entry on first sight.
    ///
    /// Returns `(index, is_new)`. On first sight `make_geometry` runs
    /// **before** anything is registered; if it fails, neither the table nor
    /// the cache changes and the error is returned. On repeat sight
    /// `make_geometry` is not called.
    pub fn get_or_add<G, E>(
        &mut self,
        table: &mut TopologyTable<G>,
        class: TopologyClass,
        key: K,
        make_geometry: impl FnOnce() -> Result<Option<G>, E>,
    ) -> Result<(usize, bool), E>
    where
        G: Copy,
    {
        if let Some(index) = self.lookup(class, key) {
            return Ok((index, false));
        }
        let geometry = make_geometry()?;
        let index = table.push(class, geometry);
        self.maps[class.slot()].insert(key, index);
        Ok((index, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_sight_returns_same_index() {
        let mut table: TopologyTable<u32> = TopologyTable::new();
        let mut cache: TopologyCache<u64> = TopologyCache::new();

        let (a, new_a) = cache
            .get_or_add(&mut table, TopologyClass::Edge, 10, || Ok::<_, ()>(Some(1)))
            .unwrap();
        let (b, new_b) = cache
            .get_or_add(&mut table, TopologyClass::Edge, 10, || Ok::<_, ()>(Some(2)))
            .unwrap();
        assert_eq!(a, b);
        assert!(new_a);
        assert!(!new_b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.geometry_at(a), Some(1));
    }

    #[test]
    fn classes_have_separate_namespaces() {
        let mut table: TopologyTable<u32> = TopologyTable::new();
        let mut cache: TopologyCache<u64> = TopologyCache::new();
        let (body, _) = cache
            .get_or_add(&mut table, TopologyClass::Body, 1, || Ok::<_, ()>(None))
            .unwrap();
        let (region, is_new) = cache
            .get_or_add(&mut table, TopologyClass::Region, 1, || Ok::<_, ()>(None))
            .unwrap();
        assert!(is_new);
        assert_ne!(body, region);
        assert_eq!(cache.len(TopologyClass::Body), 1);
        assert_eq!(cache.len(TopologyClass::Region), 1);
    }

    #[test]
    fn failed_geometry_registers_nothing() {
        let mut table: TopologyTable<u32> = TopologyTable::new();
        let mut cache: TopologyCache<u64> = TopologyCache::new();
        let err = cache.get_or_add(&mut table, TopologyClass::Vertex, 5, || Err("no point"));
        assert_eq!(err, Err("no point"));
        assert!(table.is_empty());
        assert_eq!(cache.lookup(TopologyClass::Vertex, 5), None);

        // A later attempt may still succeed.
        let (index, is_new) = cache
            .get_or_add(&mut table, TopologyClass::Vertex, 5, || Ok::<_, &str>(Some(3)))
            .unwrap();
        assert!(is_new);
        assert_eq!(index, 0);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut table: TopologyTable<u32> = TopologyTable::new();
        let mut cache: TopologyCache<u64> = TopologyCache::new();
        cache
            .get_or_add(&mut table, TopologyClass::Face, 1, || Ok::<_, ()>(Some(9)))
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.lookup(TopologyClass::Face, 1), None);
    }
}
