//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

// == Region Policy ==
/// How the manager treats a region name it has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionPolicy {
    /// Provision the region with the default capacity on first use.
    #[default]
    AutoCreate,
    /// Refuse writes to unknown regions; reads simply miss.
    Strict,
}

impl RegionPolicy {
    /// Parses `auto` / `strict` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" | "auto-create" | "autocreate" => Some(Self::AutoCreate),
            "strict" | "fail-fast" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Regions provisioned when a manager is constructed.
pub const DEFAULT_REGIONS: &[(&str, usize)] = &[
    ("theme.colors", 256),
    ("query.results", 128),
    ("render.content", 64),
];

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Capacity used for regions created implicitly by Set/Get
    pub default_capacity: usize,
    /// Treatment of unknown region names
    pub region_policy: RegionPolicy,
    /// Regions created up front, as (name, capacity)
    pub default_regions: Vec<(String, usize)>,
    /// Background sweeper interval in seconds
    pub sweep_interval: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_CAPACITY` - Capacity for implicit regions (default: 100)
    /// - `CACHE_REGION_POLICY` - `auto` or `strict` (default: auto)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_capacity: env::var("CACHE_DEFAULT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&c: &usize| c > 0)
                .unwrap_or(defaults.default_capacity),
            region_policy: env::var("CACHE_REGION_POLICY")
                .ok()
                .and_then(|v| RegionPolicy::parse(&v))
                .unwrap_or(defaults.region_policy),
            default_regions: defaults.default_regions,
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&s: &u64| s > 0)
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Configuration with no pre-provisioned regions.
    pub fn empty() -> Self {
        Self {
            default_regions: Vec::new(),
            ..Self::default()
        }
    }

    /// Builder-style override of the region policy.
    pub fn with_policy(mut self, policy: RegionPolicy) -> Self {
        self.region_policy = policy;
        self
    }

    /// Sweep interval as a Duration, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_capacity: 100,
            region_policy: RegionPolicy::AutoCreate,
            default_regions: DEFAULT_REGIONS
                .iter()
                .map(|(name, capacity)| (name.to_string(), *capacity))
                .collect(),
            sweep_interval: 30,
        }
    }
}
