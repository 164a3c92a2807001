// Copyright 2025 Annodex (https://github.com/annodex)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bidirectional maps
//!
//! [`Bidict`] is a many-to-one forward map with a transparently
//! maintained one-to-many inverse; every parent↔children relationship in
//! the hierarchy is indexed through one. [`OrderedBidict`] is the
//! read-only variant built once from ordered partitions, used for the
//! few-shot class splits where "position within the partition" is itself
//! meaningful.
//!
//! Invariant, after every mutation: `forward[k] == v` iff
//! `k ∈ inverse[v]`, and no inverse entry is an empty set.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BidictError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key '{0}' assigned to more than one partition")]
    DuplicateAssignment(String),
}

/// Forward many-to-one map with automatically maintained inverse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: DeserializeOwned, V: DeserializeOwned"
))]
pub struct Bidict<K, V>
where
    K: Eq + Hash + Ord,
    V: Eq + Hash,
{
    fwd: HashMap<K, V>,
    inv: HashMap<V, BTreeSet<K>>,
}

impl<K, V> Default for Bidict<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Bidict<K, V>
where
    K: Eq + Hash + Ord + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            fwd: HashMap::new(),
            inv: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.fwd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fwd.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.fwd.contains_key(key)
    }

    /// Forward lookup.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.fwd.get(key)
    }

    /// Associate `key` with `value`, detaching any previous association.
    ///
    /// If the previous value's key set becomes empty, its inverse entry is
    /// pruned. Amortized O(log n) for the inverse set updates.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(old) = self.fwd.insert(key.clone(), value.clone()) {
            if old != value {
                self.detach_inverse(&old, &key);
            }
        }
        self.inv.entry(value).or_default().insert(key);
    }

    /// Remove `key`, cleaning up the inverse side symmetrically.
    pub fn remove(&mut self, key: &K) -> Result<V, BidictError>
    where
        K: fmt::Display,
    {
        let value = self
            .fwd
            .remove(key)
            .ok_or_else(|| BidictError::KeyNotFound(key.to_string()))?;
        self.detach_inverse(&value, key);
        Ok(value)
    }

    /// Keys currently mapped to `value`, in sorted order.
    ///
    /// Returns the empty set, never an error, for values with no keys, so
    /// traversal call sites need no "no children" special case.
    pub fn inverse_get(&self, value: &V) -> BTreeSet<K> {
        self.inv.get(value).cloned().unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.fwd.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inv.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.fwd.iter()
    }

    fn detach_inverse(&mut self, value: &V, key: &K) {
        let prune = match self.inv.get_mut(value) {
            Some(set) => {
                set.remove(key);
                set.is_empty()
            }
            // Forward and inverse out of sync: logic corruption, not a
            // recoverable condition.
            None => panic!("bidict inverse entry missing for a mapped value"),
        };
        if prune {
            self.inv.remove(value);
        }
    }

    /// Verify the forward/inverse consistency invariant. Panics on breach;
    /// a breach is a programming error, not an input error.
    pub fn assert_invariants(&self) {
        for (k, v) in &self.fwd {
            let set = self
                .inv
                .get(v)
                .unwrap_or_else(|| panic!("inverse entry missing"));
            assert!(set.contains(k), "key missing from its inverse set");
        }
        let inverse_total: usize = self.inv.values().map(|s| s.len()).sum();
        assert_eq!(inverse_total, self.fwd.len(), "dangling inverse keys");
        assert!(
            self.inv.values().all(|s| !s.is_empty()),
            "empty inverse entry not pruned"
        );
    }
}

/// Read-only bidirectional map built from ordered partitions.
///
/// Bulk construction replaces `set`/`remove`: each partition is a value
/// plus the ordered keys assigned to it, and a key may appear in exactly
/// one partition. [`OrderedBidict::lookup`] also reports the key's
/// position within its partition, the basis for contiguous re-indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "K: Serialize, V: Serialize",
    deserialize = "K: DeserializeOwned, V: DeserializeOwned"
))]
pub struct OrderedBidict<K, V>
where
    K: Eq + Hash + Ord,
    V: Eq + Hash,
{
    fwd: HashMap<K, (V, usize)>,
    partitions: Vec<(V, Vec<K>)>,
}

impl<K, V> OrderedBidict<K, V>
where
    K: Eq + Hash + Ord + Clone + fmt::Display,
    V: Eq + Hash + Clone,
{
    /// Build from `(value, ordered keys)` partitions. Fails fast if a key
    /// is assigned to more than one partition (or twice to the same one).
    pub fn from_partitions(partitions: Vec<(V, Vec<K>)>) -> Result<Self, BidictError> {
        let mut fwd = HashMap::new();
        for (value, keys) in &partitions {
            for (pos, key) in keys.iter().enumerate() {
                if fwd
                    .insert(key.clone(), (value.clone(), pos))
                    .is_some()
                {
                    return Err(BidictError::DuplicateAssignment(key.to_string()));
                }
            }
        }
        Ok(Self { fwd, partitions })
    }

    pub fn len(&self) -> usize {
        self.fwd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fwd.is_empty()
    }

    /// Partition value of `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.fwd.get(key).map(|(v, _)| v)
    }

    /// Partition value and position-within-partition of `key`.
    pub fn lookup(&self, key: &K) -> Option<(&V, usize)> {
        self.fwd.get(key).map(|(v, pos)| (v, *pos))
    }

    /// Ordered keys of a partition; empty for an unknown value.
    pub fn keys_of(&self, value: &V) -> &[K] {
        self.partitions
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, keys)| keys.as_slice())
            .unwrap_or(&[])
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.partitions.iter().map(|(v, _)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_set_and_inverse() {
        let mut map = Bidict::new();
        map.set("S1".to_string(), "A1".to_string());
        map.set("S2".to_string(), "A1".to_string());
        map.set("S3".to_string(), "A2".to_string());

        assert_eq!(map.get(&"S1".to_string()), Some(&"A1".to_string()));
        let children = map.inverse_get(&"A1".to_string());
        assert_eq!(
            children.into_iter().collect::<Vec<_>>(),
            vec!["S1".to_string(), "S2".to_string()]
        );
        map.assert_invariants();
    }

    #[test]
    fn test_reassign_prunes_old_value() {
        let mut map = Bidict::new();
        map.set("k", "v1");
        map.set("k", "v2");

        assert!(map.inverse_get(&"v1").is_empty());
        assert_eq!(map.inverse_get(&"v2").len(), 1);
        map.assert_invariants();
    }

    #[test]
    fn test_delete_prunes_empty_inverse_entry() {
        // Deleting the only key of a value removes the inverse entry
        // entirely, not just empties it.
        let mut map = Bidict::new();
        map.set("A".to_string(), "v".to_string());
        map.remove(&"A".to_string()).unwrap();

        assert!(map.is_empty());
        assert_eq!(map.values().count(), 0);
        map.assert_invariants();
    }

    #[test]
    fn test_delete_absent_key() {
        let mut map: Bidict<String, String> = Bidict::new();
        map.set("A".to_string(), "v".to_string());
        assert!(matches!(
            map.remove(&"B".to_string()),
            Err(BidictError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_inverse_of_unknown_value_is_empty() {
        let map: Bidict<String, String> = Bidict::new();
        assert!(map.inverse_get(&"anything".to_string()).is_empty());
    }

    #[test]
    fn test_ordered_bidict_positions() {
        let map = OrderedBidict::from_partitions(vec![
            ("train", vec!["cooking", "plating"]),
            ("val", vec!["cleaning"]),
        ])
        .unwrap();

        assert_eq!(map.lookup(&"plating"), Some((&"train", 1)));
        assert_eq!(map.lookup(&"cleaning"), Some((&"val", 0)));
        assert_eq!(map.keys_of(&"train"), &["cooking", "plating"]);
        assert_eq!(map.keys_of(&"test"), &[] as &[&str]);
        assert_eq!(map.get(&"unknown"), None);
    }

    #[test]
    fn test_ordered_bidict_rejects_double_assignment() {
        let result = OrderedBidict::from_partitions(vec![
            ("train", vec!["cooking"]),
            ("val", vec!["cooking"]),
        ]);
        assert!(matches!(result, Err(BidictError::DuplicateAssignment(_))));
    }

    /// Scripted operation against a `Bidict<u8, u8>`.
    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, u8),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..16, 0u8..4).prop_map(|(k, v)| Op::Set(k, v)),
            (0u8..16).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_inverse_consistency(ops in prop::collection::vec(op_strategy(), 0..64)) {
            let mut map = Bidict::new();
            for op in ops {
                match op {
                    Op::Set(k, v) => map.set(k, v),
                    Op::Remove(k) => {
                        // Absent keys error; that path is covered above.
                        let _ = map.remove(&k);
                    }
                }
                map.assert_invariants();
            }
        }
    }
}
