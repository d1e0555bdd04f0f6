//! Region Module
//!
//! A capacity-bounded cache partition built on `lru::LruCache`, with lazy
//! TTL expiration. Regions are only ever touched by the
//! manager, which wraps each one in its own lock.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::debug;

use crate::cache::{CacheEntry, RegionCounters, RegionStats};

// == Insert Outcome ==
/// Entries displaced by an insert, returned so their tags can be retired.
#[derive(Debug)]
pub struct InsertOutcome<V> {
    /// Previous entry stored under the same key
    pub replaced: Option<CacheEntry<V>>,
    /// Least recently used entry pushed out to make room
    pub evicted: Option<(String, CacheEntry<V>)>,
}

// == Lookup ==
/// Result of a region lookup.
#[derive(Debug)]
pub enum Lookup<V> {
    Hit(V),
    Miss,
    /// The entry had expired and was removed; carries it for tag retirement.
    Expired(CacheEntry<V>),
}

// == Region ==
/// Capacity-bounded partition with LRU eviction and TTL support.
///
/// Storage and recency live in one `LruCache`, most recently used first,
/// so they cannot drift apart.
#[derive(Debug)]
pub struct Region<V> {
    name: String,
    capacity: NonZeroUsize,
    entries: LruCache<String, CacheEntry<V>>,
    counters: RegionCounters,
}

impl<V: Clone> Region<V> {
    // == Constructor ==
    /// Creates an empty region.
    pub fn new(name: impl Into<String>, capacity: NonZeroUsize) -> Self {
        Self {
            name: name.into(),
            capacity,
            entries: LruCache::new(capacity),
            counters: RegionCounters::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Insert ==
    /// Stores an entry, replacing any previous entry under the same key.
    ///
    /// If the key is new and the region is full, the least recently used
    /// entry is evicted first and counted. The key becomes the most recently
    /// used.
    pub fn insert(
        &mut self,
        key: &str,
        value: V,
        tags: HashSet<String>,
        ttl: Option<Duration>,
    ) -> InsertOutcome<V> {
        let mut evicted = None;
        if !self.entries.contains(key) && self.len() >= self.capacity() {
            evicted = self.evict_oldest();
        }

        let entry = CacheEntry::new(value, tags, ttl);
        let replaced = self.entries.put(key.to_string(), entry);

        InsertOutcome { replaced, evicted }
    }

    // == Remove ==
    /// Removes an entry by key, returning it if it was resident.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.pop(key)
    }

    /// Removes an entry only if it satisfies `predicate`.
    pub fn remove_if<F>(&mut self, key: &str, predicate: F) -> Option<CacheEntry<V>>
    where
        F: FnOnce(&CacheEntry<V>) -> bool,
    {
        if self.entries.peek(key).is_some_and(predicate) {
            self.remove(key)
        } else {
            None
        }
    }

    // == Touch And Get ==
    /// Retrieves a value by key, marking it most recently used.
    ///
    /// Expired entries are removed and counted as misses, never as evictions.
    pub fn touch_and_get(&mut self, key: &str) -> Lookup<V> {
        let now = Instant::now();
        let expired = match self.entries.peek(key) {
            None => {
                self.counters.record_miss();
                return Lookup::Miss;
            }
            Some(entry) => entry.is_expired_at(now),
        };

        if expired {
            self.counters.record_miss();
            return match self.remove(key) {
                Some(entry) => {
                    debug!(region = %self.name(), key, "removed expired entry on access");
                    Lookup::Expired(entry)
                }
                None => Lookup::Miss,
            };
        }

        // get_mut promotes the key to most recently used
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.hits += 1;
                let value = entry.value.clone();
                self.counters.record_hit();
                Lookup::Hit(value)
            }
            None => Lookup::Miss,
        }
    }

    // == Evict Oldest ==
    /// Removes the least recently used entry and counts the eviction.
    pub fn evict_oldest(&mut self) -> Option<(String, CacheEntry<V>)> {
        let (key, entry) = self.entries.pop_lru()?;
        self.counters.record_eviction();
        debug!(region = %self.name(), key = %key, "evicted least recently used entry");
        Some((key, entry))
    }

    // == Purge Expired ==
    /// Removes all expired entries without touching any counter.
    pub fn purge_expired(&mut self) -> Vec<(String, CacheEntry<V>)> {
        let now = Instant::now();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        expired_keys
            .into_iter()
            .filter_map(|key| self.remove(&key).map(|entry| (key, entry)))
            .collect()
    }

    // == Drain ==
    /// Empties the region and resets its counters, returning what was resident.
    pub fn drain(&mut self) -> Vec<(String, CacheEntry<V>)> {
        self.counters.reset();
        let mut drained = Vec::with_capacity(self.len());
        while let Some(pair) = self.entries.pop_lru() {
            drained.push(pair);
        }
        drained
    }

    // == Stats ==
    pub fn stats(&self) -> RegionStats {
        RegionStats::new(self.name(), self.len(), self.capacity(), self.counters)
    }

    /// Keys from most to least recently used.
    pub fn recency(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Looks at a resident entry without affecting recency or counters.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.peek(key)
    }

    /// Checks that the recency order holds each resident key exactly once
    /// and that the capacity bound holds.
    pub fn is_consistent(&self) -> bool {
        let order = self.recency();
        let unique: HashSet<&String> = order.iter().collect();

        order.len() == self.len()
            && unique.len() == order.len()
            && order.iter().all(|key| self.entries.contains(key.as_str()))
            && self.len() <= self.capacity()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn no_tags() -> HashSet<String> {
        HashSet::new()
    }

    fn get<V: Clone>(region: &mut Region<V>, key: &str) -> Option<V> {
        match region.touch_and_get(key) {
            Lookup::Hit(value) => Some(value),
            _ => None,
        }
    }

    #[test]
    fn test_region_new() {
        let region: Region<i32> = Region::new("T", cap(10));
        assert_eq!(region.name(), "T");
        assert_eq!(region.capacity(), 10);
        assert_eq!(region.len(), 0);
    }

    #[test]
    fn test_region_insert_and_get() {
        let mut region = Region::new("T", cap(10));

        region.insert("key1", "value1", no_tags(), None);

        assert_eq!(get(&mut region, "key1"), Some("value1"));
        assert_eq!(region.len(), 1);
        assert_eq!(region.peek("key1").map(|e| e.hits), Some(1));
    }

    #[test]
    fn test_region_get_nonexistent_counts_miss() {
        let mut region: Region<i32> = Region::new("T", cap(10));

        assert!(matches!(region.touch_and_get("nope"), Lookup::Miss));
        assert_eq!(region.stats().misses, 1);
    }

    #[test]
    fn test_region_overwrite_returns_replaced() {
        let mut region = Region::new("T", cap(10));

        region.insert("key1", 1, no_tags(), None);
        let outcome = region.insert("key1", 2, no_tags(), None);

        assert_eq!(outcome.replaced.map(|e| e.value), Some(1));
        assert!(outcome.evicted.is_none());
        assert_eq!(get(&mut region, "key1"), Some(2));
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_region_overwrite_at_capacity_does_not_evict() {
        let mut region = Region::new("T", cap(2));

        region.insert("a", 1, no_tags(), None);
        region.insert("b", 2, no_tags(), None);
        let outcome = region.insert("a", 3, no_tags(), None);

        assert!(outcome.evicted.is_none());
        assert_eq!(region.stats().evictions, 0);
        assert_eq!(region.recency(), vec!["a", "b"]);
    }

    #[test]
    fn test_region_recency_follows_reads_and_writes() {
        let mut region = Region::new("T", cap(3));

        region.insert("a", 1, no_tags(), None);
        region.insert("b", 2, no_tags(), None);
        region.insert("c", 3, no_tags(), None);
        assert_eq!(region.recency(), vec!["c", "b", "a"]);

        get(&mut region, "a");
        region.insert("b", 20, no_tags(), None);
        assert_eq!(region.recency(), vec!["b", "a", "c"]);

        // A miss and a peek leave the order alone
        get(&mut region, "zzz");
        region.peek("c");
        assert_eq!(region.recency(), vec!["b", "a", "c"]);

        let (evicted, _) = region.evict_oldest().unwrap();
        assert_eq!(evicted, "c");
        assert!(region.is_consistent());
    }

    #[test]
    fn test_region_lru_eviction() {
        let mut region = Region::new("T", cap(3));

        region.insert("key1", 1, no_tags(), None);
        region.insert("key2", 2, no_tags(), None);
        region.insert("key3", 3, no_tags(), None);
        let outcome = region.insert("key4", 4, no_tags(), None);

        assert_eq!(outcome.evicted.map(|(k, _)| k), Some("key1".to_string()));
        assert_eq!(region.len(), 3);
        assert_eq!(region.stats().evictions, 1);
        assert_eq!(get(&mut region, "key1"), None);
        assert_eq!(get(&mut region, "key2"), Some(2));
    }

    #[test]
    fn test_region_lru_touch_on_get() {
        let mut region = Region::new("T", cap(3));

        region.insert("key1", 1, no_tags(), None);
        region.insert("key2", 2, no_tags(), None);
        region.insert("key3", 3, no_tags(), None);

        get(&mut region, "key1");
        region.insert("key4", 4, no_tags(), None);

        assert_eq!(get(&mut region, "key1"), Some(1));
        assert_eq!(get(&mut region, "key2"), None);
    }

    #[test]
    fn test_region_ttl_expiration_is_a_miss_not_an_eviction() {
        let mut region = Region::new("T", cap(10));

        region.insert("key1", 1, no_tags(), Some(Duration::from_millis(50)));
        assert_eq!(get(&mut region, "key1"), Some(1));

        sleep(Duration::from_millis(80));

        assert!(matches!(region.touch_and_get("key1"), Lookup::Expired(_)));
        let stats = region.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 0);
        assert_eq!(region.len(), 0);
        assert!(region.is_consistent());
    }

    #[test]
    fn test_region_remove() {
        let mut region = Region::new("T", cap(10));

        region.insert("key1", 1, no_tags(), None);

        assert_eq!(region.remove("key1").map(|e| e.value), Some(1));
        assert!(region.remove("key1").is_none());
        assert_eq!(region.len(), 0);
        assert!(region.is_consistent());
    }

    #[test]
    fn test_region_remove_if() {
        let mut region = Region::new("T", cap(10));
        let tags: HashSet<String> = ["t".to_string()].into_iter().collect();

        region.insert("tagged", 1, tags, None);
        region.insert("plain", 2, no_tags(), None);

        assert!(region.remove_if("plain", |e| e.has_tag("t")).is_none());
        assert!(region.remove_if("tagged", |e| e.has_tag("t")).is_some());
        assert_eq!(region.len(), 1);
    }

    #[test]
    fn test_region_purge_expired() {
        let mut region = Region::new("T", cap(10));

        region.insert("short", 1, no_tags(), Some(Duration::from_millis(30)));
        region.insert("long", 2, no_tags(), Some(Duration::from_secs(10)));
        region.insert("forever", 3, no_tags(), None);

        sleep(Duration::from_millis(60));

        let purged = region.purge_expired();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].0, "short");
        assert_eq!(region.len(), 2);
        assert_eq!(region.stats().misses, 0);
        assert!(region.is_consistent());
    }

    #[test]
    fn test_region_drain_resets_counters() {
        let mut region = Region::new("T", cap(2));

        region.insert("a", 1, no_tags(), None);
        region.insert("b", 2, no_tags(), None);
        region.insert("c", 3, no_tags(), None);
        get(&mut region, "c");
        get(&mut region, "a");

        let drained = region.drain();
        assert_eq!(drained.len(), 2);

        let stats = region.stats();
        assert_eq!((stats.count, stats.hits, stats.misses, stats.evictions), (0, 0, 0, 0));
        assert_eq!(stats.capacity, 2);
        assert!(region.recency().is_empty());
    }
}
