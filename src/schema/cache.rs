//! Bounded LRU cache of fetched descriptor sets, keyed by
//! `owner/repository@version`.

use indexmap::IndexMap;
use prost_types::FileDescriptorSet;
use std::time::Instant;

pub struct CacheEntry {
    pub descriptor_set: FileDescriptorSet,
    pub last_access: Instant,
}

/// Strict LRU on `last_access`: a hit refreshes the timestamp, a miss that
/// would grow the cache past `max_size` evicts the oldest entry first.
pub struct DescriptorCache {
    entries: IndexMap<String, CacheEntry>,
    max_size: usize,
}

impl DescriptorCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: IndexMap::new(),
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up `key`, refreshing its `last_access` on a hit.
    pub fn get(&mut self, key: &str) -> Option<&FileDescriptorSet> {
        if self.entries.contains_key(key) {
            self.entries[key].last_access = Instant::now();
        }
        self.entries.get(key).map(|e| &e.descriptor_set)
    }

    /// Inserts `key`, evicting the least-recently-accessed entry first if
    /// the cache is full and `key` is not already present.
    pub fn insert(&mut self, key: String, descriptor_set: FileDescriptorSet) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                descriptor_set,
                last_access: Instant::now(),
            },
        );
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access)
            .map(|(k, _)| k.clone())
        {
            self.entries.shift_remove(&oldest_key);
        }
    }
}
