//! Advisory result cache attached to each entry.
//!
//! The cache is bounded and least-recently-used entries are evicted first.
//! A miss is never an error: resolution is pure, so the caller recomputes and
//! stores the result again. A capacity of zero disables caching entirely.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::artifact::Platform;

/// Default number of cached results per entry.
pub const DEFAULT_CAPACITY: usize = 16;

/// What a cached result was computed for.
///
/// `counterpart: None` is the entry's own `obfuscated -> self` resolution;
/// `Some(name)` is a conversion from `name` into the entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub platform: Platform,
    pub counterpart: Option<String>,
}

impl CacheKey {
    pub fn resolved(platform: Platform) -> Self {
        Self { platform, counterpart: None }
    }

    pub fn conversion(platform: Platform, counterpart: &str) -> Self {
        Self { platform, counterpart: Some(counterpart.to_string()) }
    }
}

/// Bounded LRU map guarded by a mutex. The lock is only held for the lookup
/// or the insertion, never while a value is being computed.
pub struct AdvisoryCache<K, V> {
    capacity: usize,
    slots: Mutex<VecDeque<(K, V)>>,
}

impl<K: PartialEq, V: Clone> AdvisoryCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, slots: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn slots(&self) -> MutexGuard<'_, VecDeque<(K, V)>> {
        // Slots hold plain values, so a poisoned lock still guards valid data.
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, marking it as most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut slots = self.slots();
        let position = slots.iter().position(|(k, _)| k == key)?;
        let slot = slots.remove(position)?;
        let value = slot.1.clone();
        slots.push_back(slot);
        Some(value)
    }

    /// Store `value` under `key`, evicting the least recently used slot when full.
    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut slots = self.slots();
        if let Some(position) = slots.iter().position(|(k, _)| *k == key) {
            slots.remove(position);
        }
        while slots.len() >= self.capacity {
            slots.pop_front();
        }
        slots.push_back((key, value));
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached value.
    pub fn clear(&self) {
        self.slots().clear();
    }
}

impl<K, V> fmt::Debug for AdvisoryCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisoryCache").field("capacity", &self.capacity).finish_non_exhaustive()
    }
}
