//! Cache Statistics Module
//!
//! Tracks per-region performance counters and builds the diagnostic snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Region Counters ==
/// Monotonic hit/miss/eviction counters owned by a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionCounters {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of failed lookups (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
}

impl RegionCounters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Region Stats ==
/// Point-in-time statistics for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    /// Region name
    pub name: String,
    /// Current number of resident entries
    pub count: usize,
    /// Maximum number of resident entries
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// hits / (hits + misses) as a percentage, rounded to one decimal
    pub hit_rate_percent: f64,
}

impl RegionStats {
    /// Builds a snapshot from a region's counters.
    pub fn new(
        name: impl Into<String>,
        count: usize,
        capacity: usize,
        counters: RegionCounters,
    ) -> Self {
        Self {
            name: name.into(),
            count,
            capacity,
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            hit_rate_percent: hit_rate_percent(counters.hits, counters.misses),
        }
    }
}

// == Cache Stats ==
/// Snapshot of every region, sorted by region name.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
    pub regions: Vec<RegionStats>,
}

impl CacheStats {
    /// Looks up a region's snapshot by name.
    pub fn region(&self, name: &str) -> Option<&RegionStats> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Total resident entries across all regions.
    pub fn total_entries(&self) -> usize {
        self.regions.iter().map(|r| r.count).sum()
    }
}

// == Hit Rate ==
/// Calculates the hit rate as a percentage rounded to one decimal.
///
/// Returns 0.0 if no lookups have been made.
pub fn hit_rate_percent(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }
    let percent = hits as f64 / total as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}
