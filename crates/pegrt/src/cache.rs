//! # Bounded Cache
//!
//! Capacity-limited mapping with insertion-order eviction, backing the
//! packrat memo table.
//!
//! The cache memoizes `(rule, position)` outcomes so that overlapping
//! alternatives do not re-derive identical sub-parses, while eviction
//! bounds memory on long inputs. Recency is write-only: [`BoundedCache::set`]
//! removes and reinserts an existing key at the most-recent position, but
//! [`BoundedCache::get`] and [`BoundedCache::contains`] never alter
//! insertion order. Eviction removes the oldest remaining entry by
//! insertion order, never by access.

use crate::error::{ConfigError, ParseError};
use lru::LruCache;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Identifier for a generated grammar rule, assigned densely by the
/// generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub u32);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule#{}", self.0)
    }
}

/// Memo table key: which rule was applied at which absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub rule: RuleId,
    pub position: usize,
}

/// A recorded rule outcome.
///
/// Failures keep the recoverable error so a replay reproduces the
/// original outcome exactly. Fatal errors are never memoized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoEntry<V> {
    /// The rule matched, producing `value` and leaving the cursor at
    /// `end_pos`.
    Success { value: V, end_pos: usize },
    /// The rule failed recoverably at this position.
    Failure(ParseError),
}

/// The packrat memo table.
pub type MemoCache<V> = BoundedCache<MemoKey, MemoEntry<V>>;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub evictions: usize,
    /// Current number of entries.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, in `0.0..=1.0`.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self {
            entries: self.entries,
            ..Self::default()
        };
    }
}

/// A capacity-limited map that evicts in insertion order.
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: LruCache<K, V, ahash::RandomState>,
    stats: CacheStats,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        let capacity =
            NonZeroUsize::new(capacity).ok_or(ConfigError::ZeroCapacity { what: "memo cache" })?;
        Ok(Self {
            entries: LruCache::with_hasher(capacity, ahash::RandomState::new()),
            stats: CacheStats::default(),
        })
    }

    /// Insert or replace an entry.
    ///
    /// An existing entry for the key is removed and reinserted at the
    /// most-recent position. If the cache is full, the single oldest
    /// remaining entry is evicted. Size never exceeds capacity after any
    /// mutating call.
    pub fn set(&mut self, key: K, value: V) {
        if self.entries.contains(&key) {
            self.entries.pop(&key);
        }
        if self.entries.push(key, value).is_some() {
            self.stats.evictions += 1;
        }
        self.stats.entries = self.entries.len();
    }

    /// Look up an entry without altering insertion order.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let found = self.entries.peek(key);
        if found.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        found
    }

    /// Membership test; never alters insertion order or statistics.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.pop(key);
        self.stats.entries = self.entries.len();
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.entries = 0;
    }

    /// Iterate entries, most recently inserted first.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    #[must_use]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K: Hash + Eq, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats)
            .finish()
    }
}
