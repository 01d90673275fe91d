//! Fault-recency registry.
//!
//! Registered caches are kept in the order of their last fault: the front has
//! gone longest without one, the back faulted most recently. The director
//! scans from the front when it needs a donor block. Miss counters live here
//! as well so they follow a cache's registration.

use std::collections::{HashMap, VecDeque};

use crate::common::CacheId;

/// Recency order and miss counters of registered caches.
#[derive(Debug, Default)]
pub struct Registry {
    order: VecDeque<CacheId>,
    misses: HashMap<CacheId, u64>,
    total_misses: u64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered caches.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no cache is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// True if `id` is registered.
    pub fn contains(&self, id: CacheId) -> bool {
        self.misses.contains_key(&id)
    }

    /// Appends `id` at the back with a fresh miss counter.
    pub fn register(&mut self, id: CacheId) {
        debug_assert!(!self.contains(id), "cache {id} registered twice");
        self.order.push_back(id);
        let _ = self.misses.insert(id, 0);
    }

    /// Removes `id`; returns false if it was not registered.
    pub fn unregister(&mut self, id: CacheId) -> bool {
        if self.misses.remove(&id).is_none() {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|&c| c == id) {
            let _ = self.order.remove(pos);
        }
        true
    }

    /// Moves `id` to the back and counts one miss against it.
    ///
    /// Unregistered ids are ignored.
    pub fn record_miss(&mut self, id: CacheId) {
        let Some(count) = self.misses.get_mut(&id) else {
            return;
        };
        *count += 1;
        self.total_misses += 1;
        if let Some(pos) = self.order.iter().position(|&c| c == id) {
            let _ = self.order.remove(pos);
        }
        self.order.push_back(id);
    }

    /// Registered caches from least to most recently faulted.
    pub fn iter(&self) -> impl Iterator<Item = CacheId> + '_ {
        self.order.iter().copied()
    }

    /// Misses counted against `id`, or zero if it is not registered.
    pub fn misses(&self, id: CacheId) -> u64 {
        self.misses.get(&id).copied().unwrap_or(0)
    }

    /// Misses across all caches.
    pub const fn total_misses(&self) -> u64 {
        self.total_misses
    }

    /// Zeroes every miss counter and the total.
    pub fn reset_misses(&mut self) {
        self.misses.values_mut().for_each(|m| *m = 0);
        self.total_misses = 0;
    }

    /// Exchanges the registrations of `a` and `b`, including position and counters.
    pub fn swap(&mut self, a: CacheId, b: CacheId) {
        for id in &mut self.order {
            if *id == a {
                *id = b;
            } else if *id == b {
                *id = a;
            }
        }
        let misses_a = self.misses.remove(&a);
        let misses_b = self.misses.remove(&b);
        if let Some(m) = misses_a {
            let _ = self.misses.insert(b, m);
        }
        if let Some(m) = misses_b {
            let _ = self.misses.insert(a, m);
        }
    }
}
