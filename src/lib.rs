//! Region Cache - An in-process, region-partitioned cache
//!
//! Provides named, capacity-bounded regions with TTL expiration, LRU eviction
//! and cross-region tag invalidation, shared safely between threads.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheManager, CacheStats, RegionStats, SharedValue, TagTarget};
pub use config::{CacheConfig, RegionPolicy};
pub use error::{CacheError, Result};
pub use tasks::{spawn_configured_sweeper, spawn_sweeper_task};
