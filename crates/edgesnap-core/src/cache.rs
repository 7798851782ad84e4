//! Bounded edge-mask cache with least-recently-used eviction.
//!
//! Recency is tracked with a logical clock rather than wall time: every
//! `get` hit and every `put` takes the next tick, so the eviction order is
//! fully determined by the sequence of calls. When two entries somehow
//! share a tick, the one inserted first goes first.
//!
//! The cache has a single owner. Hosts that share it between threads must
//! hold one lock across each whole `get`/`put` call (see
//! [`SharedEdgeDetector`](crate::SharedEdgeDetector)).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::fingerprint::Fingerprint;
use crate::types::{DEFAULT_CACHE_SIZE, EdgeMask};

#[derive(Debug, Clone)]
struct CacheEntry {
    mask: Arc<EdgeMask>,
    last_access: u64,
    inserted: u64,
}

/// Read-only snapshot of the cache contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cached masks.
    pub count: usize,
    /// Capacity bound.
    pub max_size: usize,
    /// Cached keys, least recently used first.
    pub keys: Vec<Fingerprint>,
}

/// Mapping from [`Fingerprint`] to a previously computed [`EdgeMask`].
///
/// Holds at most `max_size` entries after every operation.
#[derive(Debug, Clone)]
pub struct EdgeMaskCache {
    entries: HashMap<Fingerprint, CacheEntry>,
    max_size: usize,
    clock: u64,
    insertions: u64,
}

impl Default for EdgeMaskCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl EdgeMaskCache {
    /// Create an empty cache holding at most `max_size` masks.
    ///
    /// A capacity of zero is allowed; every `put` is then evicted
    /// immediately.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_size.saturating_add(1)),
            max_size,
            clock: 0,
            insertions: 0,
        }
    }

    /// Capacity bound.
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of cached masks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is cached. Does not count as an access.
    #[must_use]
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a mask, marking it as most recently used on a hit.
    pub fn get(&mut self, key: &Fingerprint) -> Option<Arc<EdgeMask>> {
        let now = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_access = now;
        Some(Arc::clone(&entry.mask))
    }

    /// Insert or overwrite the mask for `key`, then evict down to capacity.
    ///
    /// Returns the keys evicted to restore the bound. An overwritten entry
    /// counts as freshly inserted.
    pub fn put(&mut self, key: Fingerprint, mask: Arc<EdgeMask>) -> Vec<Fingerprint> {
        let now = self.tick();
        let inserted = self.insertions;
        self.insertions += 1;
        self.entries.insert(
            key,
            CacheEntry {
                mask,
                last_access: now,
                inserted,
            },
        );
        self.evict_if_needed()
    }

    /// Remove least recently used entries until `len() <= max_size()`.
    ///
    /// Removes only as many entries as needed and returns their keys in
    /// eviction order.
    pub fn evict_if_needed(&mut self) -> Vec<Fingerprint> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.max_size {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.last_access, entry.inserted))
                .map(|(key, _)| *key)
            else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::debug!(key = %oldest, "evicted edge mask");
            evicted.push(oldest);
        }
        evicted
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the current contents.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut by_age: Vec<(&Fingerprint, &CacheEntry)> = self.entries.iter().collect();
        by_age.sort_by_key(|(_, entry)| (entry.last_access, entry.inserted));
        CacheStats {
            count: self.entries.len(),
            max_size: self.max_size,
            keys: by_age.into_iter().map(|(key, _)| *key).collect(),
        }
    }

    const fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}
