//! Interval cache: memoized series keyed by the bucket "now" falls in.
//!
//! The key embeds the aligned start of the current bucket. While time stays
//! inside that bucket every lookup hits and returns the same `Arc<Series>`.
//! Once time crosses into the next bucket the key changes, the lookup misses
//! and the series is rebuilt, which also closes the previously active candle.
//! No dirty tracking is involved in that rollover.

use std::collections::HashMap;
use std::sync::Arc;

use momentum_core::{EntityId, Period, Series, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity_id: EntityId,
    pub period: Period,
    /// Start of the bucket containing the time of computation.
    pub bucket_start: Timestamp,
}

impl CacheKey {
    pub fn new(entity_id: &str, period: Period, now: Timestamp) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            period,
            bucket_start: period.align(now),
        }
    }

    /// Whether `now` still falls in this key's bucket.
    pub fn is_current(&self, now: Timestamp) -> bool {
        self.period.align(now) == self.bucket_start
    }
}

#[derive(Debug)]
pub struct IntervalCache {
    entries: HashMap<CacheKey, Arc<Series>>,
    max_entries: usize,
}

impl IntervalCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Return the cached series for the current bucket or compute it.
    ///
    /// `None` results are not cached, so an entity that gains its first
    /// event shows up on the next call.
    pub fn get_or_compute<F>(&mut self, entity_id: &str, period: Period, now: Timestamp, compute: F) -> Option<Arc<Series>>
    where
        F: FnOnce() -> Option<Series>,
    {
        let key = CacheKey::new(entity_id, period, now);
        if let Some(series) = self.entries.get(&key) {
            return Some(Arc::clone(series));
        }

        log::debug!("Cache miss for {}|{}|{}", key.entity_id, period, key.bucket_start);
        let series = Arc::new(compute()?);
        if self.entries.len() >= self.max_entries {
            self.sweep(now);
        }
        self.entries.insert(key, Arc::clone(&series));
        Some(series)
    }

    /// Drop entries whose bucket has passed. Falls back to a full clear if
    /// the current buckets alone exceed the limit.
    fn sweep(&mut self, now: Timestamp) {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.is_current(now));
        if self.entries.len() >= self.max_entries {
            self.entries.clear();
        }
        log::debug!("Swept interval cache: {} -> {} entries", before, self.entries.len());
    }

    /// Forget every entry of one entity.
    pub fn invalidate_entity(&mut self, entity_id: &str) {
        self.entries.retain(|key, _| key.entity_id != entity_id);
    }

    /// Forget everything, after bulk mutations such as an import.
    pub fn invalidate_all(&mut self) {
        log::info!("Clearing interval cache ({} entries)", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for IntervalCache {
    fn default() -> Self {
        Self::new(512)
    }
}
