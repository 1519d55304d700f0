/*
    Copyright © 2024, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Types that store updates to the app state that are not yet durable.

use std::collections::{hash_map, HashMap};

/// Set of key-value updates that become durable only when the block that produced them is
/// [committed](crate::execution::commit).
///
/// The chat app never deletes keys: users are never deleted, and message histories only grow. An
/// `UpdateSet` therefore only tracks insertions. Inserting the same key twice keeps the latest value.
#[derive(Clone, Debug, Default)]
pub struct UpdateSet<K: Eq + std::hash::Hash, V> {
    inserts: HashMap<K, V>,
}

impl<K: Eq + std::hash::Hash, V> UpdateSet<K, V> {
    /// Create a new, empty `UpdateSet`.
    pub fn new() -> Self {
        Self {
            inserts: HashMap::new(),
        }
    }

    /// Schedule the insertion of a `key`-`value` pair, replacing any earlier scheduled value.
    pub fn insert(&mut self, key: K, value: V) {
        self.inserts.insert(key, value);
    }

    /// Get the value scheduled to be inserted at `key`, if any.
    pub fn get_insert(&self, key: &K) -> Option<&V> {
        self.inserts.get(key)
    }

    /// Get an iterator over all of the key-value pairs that this `UpdateSet` will insert.
    pub fn inserts(&self) -> hash_map::Iter<'_, K, V> {
        self.inserts.iter()
    }

    pub fn len(&self) -> usize {
        self.inserts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty()
    }
}

/// Set of key-value updates to the app state staged by one block.
pub type AppStateUpdates = UpdateSet<Vec<u8>, Vec<u8>>;
