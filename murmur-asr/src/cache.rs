//! Process-wide model cache keyed by (size, backend-kind).
//!
//! Insertion order is significant: eviction under memory pressure retains
//! only the most-recently-inserted entry. The cache is generic over the
//! handle type so ordering and eviction logic stay testable without
//! loading real models.

use crate::types::{BackendKind, ModelSize};
use std::sync::Arc;

/// Cache key derived from the model size and the backend that actually
/// loaded, not necessarily the one requested.
pub type CacheKey = (ModelSize, BackendKind);

/// Insertion-ordered cache of shared handles.
#[derive(Debug)]
pub struct Cache<H> {
    entries: Vec<(CacheKey, Arc<H>)>,
}

/// The process-wide model cache.
pub type ModelCache = Cache<crate::provider::ModelHandle>;

impl<H> Cache<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a handle; returns a shared clone on hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<H>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, h)| Arc::clone(h))
    }

    /// Insert a handle, replacing any existing entry for the same key.
    /// The inserted entry becomes the most recent.
    pub fn insert(&mut self, key: CacheKey, handle: Arc<H>) {
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, handle));
    }

    /// Discard all entries except the most-recently-inserted one.
    /// Returns the number of entries dropped.
    pub fn evict_to_most_recent(&mut self) -> usize {
        if self.entries.len() <= 1 {
            return 0;
        }

        let evicted = self.entries.len() - 1;
        let last = self.entries.pop();
        self.entries.clear();
        self.entries.extend(last);
        evicted
    }
}

impl<H> Default for Cache<H> {
    fn default() -> Self {
        Self::new()
    }
}
