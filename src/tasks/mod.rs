//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry Sweep: Removes expired entries from every region at a fixed interval

mod sweeper;

pub use sweeper::{spawn_configured_sweeper, spawn_sweeper_task};
