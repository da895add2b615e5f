//! Generic versioned cache backing every entry in the registry.
//!
//! Lock-free concurrent map, the same shape the reference bot uses for its
//! price cache, keyed here on raw address bytes instead of formatted
//! strings so the hot commit path never allocates a key.

use crate::types::Version;
use dashmap::DashMap;
use std::hash::Hash;

#[derive(Clone, Debug)]
pub struct Versioned<V> {
    pub value: V,
    pub version: Version,
}

/// A mapping from key space to `(value, slot, write_version)` tuples. One
/// instance per entity kind: pool, vault, tick, bin, amm-config,
/// global-config.
pub struct VersionedCache<K, V> {
    inner: DashMap<K, Versioned<V>>,
}

impl<K, V> VersionedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        VersionedCache { inner: DashMap::new() }
    }

    pub fn get(&self, key: &K) -> Option<Versioned<V>> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    pub fn current_version(&self, key: &K) -> Option<Version> {
        self.inner.get(key).map(|entry| entry.version)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    /// Applies a write iff `version` is strictly newer than whatever is
    /// stored. Returns `true` if the write was applied.
    pub fn try_apply(&mut self, key: K, value: V, version: Version) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.inner.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Versioned { value, version });
                true
            }
            Entry::Occupied(mut slot) => {
                if version > slot.get().version {
                    slot.insert(Versioned { value, version });
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<Versioned<V>> {
        self.inner.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K, V> Default for VersionedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_stale_write() {
        let mut cache: VersionedCache<u8, u32> = VersionedCache::new();
        assert!(cache.try_apply(1, 100, Version::new(10, 0)));
        assert!(!cache.try_apply(1, 200, Version::new(10, 0)));
        assert!(!cache.try_apply(1, 200, Version::new(9, 5)));
        assert_eq!(cache.get(&1).unwrap().value, 100);
    }

    #[test]
    fn accepts_strictly_newer_write_version_within_same_slot() {
        let mut cache: VersionedCache<u8, u32> = VersionedCache::new();
        assert!(cache.try_apply(1, 100, Version::new(10, 0)));
        assert!(cache.try_apply(1, 200, Version::new(10, 1)));
        assert_eq!(cache.get(&1).unwrap().value, 200);
    }
}
