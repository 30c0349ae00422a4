//! One cached value per node or replica, with downstream invalidation

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::domain::graph::DependencyIndex;
use crate::domain::node::NodeKey;
use crate::types::Value;

/// A cached value and its validity
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSlot {
    /// Last computed value
    pub value: Value,

    /// Cleared when an upstream input changes
    pub valid: bool,

    /// When the value was computed
    pub computed_at: DateTime<Utc>,

    /// How many times the callable ran for this slot
    pub computations: u64,
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from a valid slot
    pub hits: u64,
    /// Reads that required running the callable
    pub misses: u64,
}

/// Cache layer keyed by [`NodeKey`]
#[derive(Debug, Clone, Default)]
pub struct NodeCache {
    slots: HashMap<NodeKey, CacheSlot>,
    stats: CacheStats,
}

impl NodeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a valid value, counting a hit or a miss
    pub fn lookup(&mut self, key: &NodeKey) -> Option<Value> {
        match self.slots.get(key) {
            Some(slot) if slot.valid => {
                self.stats.hits += 1;
                Some(slot.value.clone())
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a freshly computed value and mark it valid
    pub fn store(&mut self, key: NodeKey, value: Value) {
        let slot = self.slots.entry(key).or_insert_with(|| CacheSlot {
            value: Value::Null,
            valid: false,
            computed_at: Utc::now(),
            computations: 0,
        });
        slot.value = value;
        slot.valid = true;
        slot.computed_at = Utc::now();
        slot.computations += 1;
    }

    /// The slot behind a key, valid or not
    pub fn slot(&self, key: &NodeKey) -> Option<&CacheSlot> {
        self.slots.get(key)
    }

    /// Whether a key holds a valid value
    pub fn is_valid(&self, key: &NodeKey) -> bool {
        self.slots.get(key).map(|s| s.valid).unwrap_or(false)
    }

    /// Number of times the callable behind `key` has run
    pub fn computations(&self, key: &NodeKey) -> u64 {
        self.slots.get(key).map(|s| s.computations).unwrap_or(0)
    }

    /// Hit/miss counters
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of slots, valid or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache holds no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Invalidate `seeds` and everything downstream of them
    ///
    /// The walk stops at pinned (static) nodes and at slots that are
    /// already invalid or absent, since nothing below them can be valid.
    /// Returns the keys that went from valid to invalid.
    pub fn invalidate<I, F>(
        &mut self,
        seeds: I,
        index: &DependencyIndex,
        is_pinned: F,
    ) -> Vec<NodeKey>
    where
        I: IntoIterator<Item = NodeKey>,
        F: Fn(&NodeKey) -> bool,
    {
        let mut stack: Vec<NodeKey> = seeds.into_iter().collect();
        let mut invalidated = Vec::new();

        while let Some(key) = stack.pop() {
            if is_pinned(&key) {
                continue;
            }

            match self.slots.get_mut(&key) {
                Some(slot) if slot.valid => slot.valid = false,
                _ => continue,
            }

            debug!(node = %key, "Invalidated cache slot");
            stack.extend(index.dependents(&key).iter().cloned());
            invalidated.push(key);
        }

        invalidated
    }

    /// Drop slots entirely (used when replicas are discarded)
    pub fn evict<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a NodeKey>,
    {
        for key in keys {
            self.slots.remove(key);
        }
    }

    /// Drop every slot
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
