//! Cache Manager Module
//!
//! Public entry point: owns the region directory and the tag index.
//!
//! # Locking
//! Every region sits behind its own mutex; the manager has one more mutex for
//! the directory and the tag index. Locks are always taken region first,
//! manager second, and never two regions at once.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::region::{Lookup, Region};
use crate::cache::{CacheStats, TagIndex, TagTarget};
use crate::config::{CacheConfig, RegionPolicy};
use crate::error::{CacheError, Result};

/// Type-erased value stored by the process-wide manager.
pub type SharedValue = Arc<dyn Any + Send + Sync>;

type SharedRegion<V> = Arc<Mutex<Region<V>>>;

struct ManagerState<V> {
    regions: HashMap<String, SharedRegion<V>>,
    tags: TagIndex,
}

// == Cache Manager ==
/// Region-partitioned cache with LRU eviction, TTL expiry and tag invalidation.
///
/// Values are handed out by clone, so `V` is normally an `Arc` or another
/// cheap handle. The cache never synchronizes access to what the handle
/// points at.
pub struct CacheManager<V = SharedValue> {
    state: Mutex<ManagerState<V>>,
    config: CacheConfig,
}

impl CacheManager<SharedValue> {
    // == Global Instance ==
    /// Returns the process-wide manager, building it from the environment on
    /// first use. Concurrent first callers all observe the same instance.
    pub fn global() -> &'static CacheManager {
        static GLOBAL: OnceLock<CacheManager> = OnceLock::new();
        GLOBAL.get_or_init(|| CacheManager::new(CacheConfig::from_env()))
    }

    /// Stores any `Send + Sync` value behind an `Arc`.
    pub fn set_shared<T>(
        &self,
        region: &str,
        key: &str,
        value: T,
        tags: &[&str],
        ttl: Option<Duration>,
    ) -> Result<()>
    where
        T: Any + Send + Sync,
    {
        self.set(region, key, Arc::new(value), tags, ttl)
    }

    /// Fetches a value and downcasts it. A value of another type reads as absent.
    pub fn get_as<T>(&self, region: &str, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get(region, key)?.downcast::<T>().ok()
    }
}

impl<V: Clone> CacheManager<V> {
    // == Constructor ==
    /// Creates a manager and provisions the configured default regions.
    pub fn new(config: CacheConfig) -> Self {
        let manager = Self {
            state: Mutex::new(ManagerState {
                regions: HashMap::new(),
                tags: TagIndex::new(),
            }),
            config,
        };

        for (name, capacity) in &manager.config.default_regions {
            if let Err(err) = manager.create_region(name, *capacity) {
                warn!(region = %name, error = %err, "skipping default region");
            }
        }

        manager
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Create Region ==
    /// Creates an empty region. Idempotent: an existing region keeps its
    /// original capacity.
    pub fn create_region(&self, name: &str, capacity: usize) -> Result<()> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| CacheError::InvalidCapacity {
            region: name.to_string(),
        })?;

        let mut state = self.state.lock();
        if !state.regions.contains_key(name) {
            state
                .regions
                .insert(name.to_string(), Arc::new(Mutex::new(Region::new(name, capacity))));
            info!(region = %name, capacity = capacity.get(), "created cache region");
        }
        Ok(())
    }

    // == Clear Region ==
    /// Empties a region, retires all of its tags and resets its counters.
    pub fn clear_region(&self, name: &str) {
        let Some(region) = self.region(name) else {
            return;
        };

        let mut guard = region.lock();
        let drained = guard.drain();
        let mut state = self.state.lock();
        for (key, entry) in &drained {
            state.tags.retire(name, key, &entry.tags);
        }
        debug!(region = %name, removed = drained.len(), "cleared cache region");
    }

    // == Set ==
    /// Stores a value under `region/key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `tags` - Labels for bulk invalidation; may be empty
    /// * `ttl` - `None` or a zero duration means the entry never expires
    ///
    /// Fails only when the region is unknown and the policy is strict.
    pub fn set(
        &self,
        region: &str,
        key: &str,
        value: V,
        tags: &[&str],
        ttl: Option<Duration>,
    ) -> Result<()> {
        let shared = self.provision(region)?;
        let tag_set: HashSet<String> = tags.iter().map(|t| t.to_string()).collect();

        let mut guard = shared.lock();
        let outcome = guard.insert(key, value, tag_set, ttl);

        let mut state = self.state.lock();
        if let Some(old) = &outcome.replaced {
            state.tags.retire(region, key, &old.tags);
        }
        if let Some((evicted_key, evicted)) = &outcome.evicted {
            state.tags.retire(region, evicted_key, &evicted.tags);
        }
        if let Some(entry) = guard.peek(key) {
            state.tags.register(region, key, &entry.tags);
        }
        Ok(())
    }

    // == Get ==
    /// Retrieves a value, marking it most recently used. Expired entries are
    /// dropped and read as absent.
    pub fn get(&self, region: &str, key: &str) -> Option<V> {
        let shared = self.region_for_read(region)?;

        let mut guard = shared.lock();
        match guard.touch_and_get(key) {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss => None,
            Lookup::Expired(entry) => {
                self.state.lock().tags.retire(region, key, &entry.tags);
                None
            }
        }
    }

    // == Try Get ==
    /// Like [`get`](Self::get), writing the value into `out` on a hit.
    /// `out` is left untouched on a miss.
    pub fn try_get(&self, region: &str, key: &str, out: &mut V) -> bool {
        match self.get(region, key) {
            Some(value) => {
                *out = value;
                true
            }
            None => false,
        }
    }

    // == Invalidate ==
    /// Removes `region/key`. Unknown regions and keys are ignored.
    pub fn invalidate(&self, region: &str, key: &str) {
        let Some(shared) = self.region(region) else {
            return;
        };

        let mut guard = shared.lock();
        if let Some(entry) = guard.remove(key) {
            self.state.lock().tags.retire(region, key, &entry.tags);
        }
    }

    // == Invalidate Tag ==
    /// Removes every entry carrying `tag`, in any region, and forgets the tag.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let targets = self.state.lock().tags.take(tag);

        let mut removed = 0;
        for target in &targets {
            let Some(shared) = self.region(&target.region) else {
                continue;
            };

            let mut guard = shared.lock();
            // The key may have been re-set without the tag since the snapshot.
            if let Some(entry) = guard.remove_if(&target.key, |entry| entry.has_tag(tag)) {
                self.state
                    .lock()
                    .tags
                    .retire(&target.region, &target.key, &entry.tags);
                removed += 1;
            }
        }

        debug!(tag, targets = targets.len(), removed, "invalidated tag");
        removed
    }

    // == Purge Expired ==
    /// Drops expired entries from every region. Neither misses nor evictions
    /// are counted. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut removed = 0;
        for (name, shared) in self.regions_snapshot() {
            let mut guard = shared.lock();
            let purged = guard.purge_expired();
            if purged.is_empty() {
                continue;
            }

            let mut state = self.state.lock();
            for (key, entry) in &purged {
                state.tags.retire(&name, key, &entry.tags);
            }
            removed += purged.len();
        }
        removed
    }

    // == Stats ==
    /// Diagnostic snapshot of every region, sorted by name.
    pub fn stats(&self) -> CacheStats {
        let mut regions = Vec::new();
        for (_, shared) in self.regions_snapshot() {
            regions.push(shared.lock().stats());
        }
        regions.sort_by(|a, b| a.name.cmp(&b.name));

        CacheStats {
            taken_at: Utc::now(),
            regions,
        }
    }

    /// Entries currently indexed under `tag`.
    pub fn tagged(&self, tag: &str) -> Vec<TagTarget> {
        self.state.lock().tags.targets(tag)
    }

    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().regions.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn contains_region(&self, name: &str) -> bool {
        self.state.lock().regions.contains_key(name)
    }

    /// Cross-checks every region's storage against its recency order and the
    /// tag index against the resident entries. Meant for quiescent callers
    /// such as tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        let indexed: Vec<(String, Vec<TagTarget>)> = self
            .state
            .lock()
            .tags
            .iter()
            .map(|(tag, targets)| (tag.clone(), targets.iter().cloned().collect()))
            .collect();

        let mut expected: HashSet<(String, TagTarget)> = HashSet::new();
        for (name, shared) in self.regions_snapshot() {
            let guard = shared.lock();
            if !guard.is_consistent() {
                return false;
            }
            for key in guard.recency() {
                if let Some(entry) = guard.peek(&key) {
                    for tag in &entry.tags {
                        expected.insert((tag.clone(), TagTarget::new(name.clone(), key.clone())));
                    }
                }
            }
        }

        let actual: HashSet<(String, TagTarget)> = indexed
            .into_iter()
            .flat_map(|(tag, targets)| targets.into_iter().map(move |t| (tag.clone(), t)))
            .collect();

        actual == expected
    }

    // == Region Resolution ==
    fn region(&self, name: &str) -> Option<SharedRegion<V>> {
        self.state.lock().regions.get(name).cloned()
    }

    fn provision(&self, name: &str) -> Result<SharedRegion<V>> {
        let mut state = self.state.lock();
        if let Some(shared) = state.regions.get(name) {
            return Ok(Arc::clone(shared));
        }

        match self.config.region_policy {
            RegionPolicy::AutoCreate => {
                let capacity =
                    NonZeroUsize::new(self.config.default_capacity).unwrap_or(NonZeroUsize::MIN);
                let shared = Arc::new(Mutex::new(Region::new(name, capacity)));
                state.regions.insert(name.to_string(), Arc::clone(&shared));
                info!(region = %name, capacity = capacity.get(), "implicitly created cache region");
                Ok(shared)
            }
            RegionPolicy::Strict => {
                warn!(region = %name, "write to unknown cache region rejected");
                Err(CacheError::UnknownRegion(name.to_string()))
            }
        }
    }

    fn region_for_read(&self, name: &str) -> Option<SharedRegion<V>> {
        match self.config.region_policy {
            RegionPolicy::AutoCreate => self.provision(name).ok(),
            RegionPolicy::Strict => {
                let shared = self.region(name);
                if shared.is_none() {
                    warn!(region = %name, "read from unknown cache region");
                }
                shared
            }
        }
    }

    fn regions_snapshot(&self) -> Vec<(String, SharedRegion<V>)> {
        self.state
            .lock()
            .regions
            .iter()
            .map(|(name, shared)| (name.clone(), Arc::clone(shared)))
            .collect()
    }
}

impl<V: Clone> Default for CacheManager<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
