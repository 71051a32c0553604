//! Generation-stamped memo cache for refresh cycles.
//!
//! Each dashboard refresh gets a monotonically increasing generation
//! number. A cached value is served only while its stored generation
//! matches the caller's; the first access of a new generation recomputes
//! and restamps. Anything else in the same generation is a cheap read, so
//! switching tabs or symbols between refreshes never refetches.
//!
//! The lock is never held across an await: concurrent first accesses may
//! both compute, last write wins. The event loop is single-tasked so in
//! practice each (key, generation) computes once.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;

pub struct RefreshCache<T: Clone> {
    entries: RwLock<HashMap<String, (u64, T)>>,
}

impl<T: Clone> RefreshCache<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Value for `key` if it was stored under exactly `generation`.
    fn fresh(&self, key: &str, generation: u64) -> Option<T> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some((stored, value)) if *stored == generation => Some(value.clone()),
            _ => None,
        }
    }

    /// Last stored value regardless of generation. This is the stale-read
    /// path for a paused dashboard.
    pub fn peek(&self, key: &str) -> Option<T> {
        self.entries
            .read()
            .get(key)
            .map(|(_, value)| value.clone())
    }

    /// Serve the cached value for `(key, generation)`, or run `compute`,
    /// store its result under `generation`, and return it. Any generation
    /// mismatch (newer or older) recomputes.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, generation: u64, compute: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.fresh(key, generation) {
            return value;
        }
        let value = compute().await;
        self.entries
            .write()
            .insert(key.to_string(), (generation, value.clone()));
        value
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T: Clone> Default for RefreshCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
