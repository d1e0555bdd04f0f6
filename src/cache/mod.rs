//! Cache Module
//!
//! Provides region-partitioned in-memory caching with TTL expiration,
//! LRU eviction and tag-based invalidation.

mod entry;
mod manager;
mod region;
mod stats;
mod tags;


// Re-export public types
pub use entry::CacheEntry;
pub use manager::{CacheManager, SharedValue};
pub use stats::{hit_rate_percent, CacheStats, RegionCounters, RegionStats};
pub use tags::{TagIndex, TagTarget};
