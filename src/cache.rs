//! # Query Cache
//!
//! A type-erased cache for query results addressed by [`CacheKey`], supporting:
//! - **Invalidation**: Entries matching a key prefix are marked stale and refetched on
//!   their next read. Data is kept so views can keep rendering it meanwhile.
//! - **Staleness**: Entries also go stale once older than the caller's stale time.
//! - **In-flight Fetches**: A fetch that was running when its key got invalidated stores
//!   its result stale, so the next read still goes to the network.
//! - **Maintenance**: Unused entries are dropped and the least recently used ones are
//!   evicted down to a size limit.
//!
//! ## Example
//! ```rust
//! use dioxus_studio_reports::cache::{CacheInvalidator, QueryCache};
//! use dioxus_studio_reports::keys::analytics_keys;
//!
//! let cache = QueryCache::new();
//! let key = analytics_keys::warehouse_access_tokens("abc123");
//! cache.set(key.clone(), vec!["token-a".to_string()]);
//! assert!(!cache.is_stale(&key));
//!
//! cache.invalidate(&analytics_keys::project("abc123"));
//! assert!(cache.is_stale(&key));
//! ```

use std::{
    any::Any,
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tracing::debug;

use crate::{keys::CacheKey, platform::Instant};

/// Capability to mark cached reads stale.
///
/// Invalidation is idempotent and commutative: invalidating an already-stale key changes
/// nothing, and the order of several invalidations does not matter.
pub trait CacheInvalidator {
    /// Marks every cached entry addressed by `key` stale. Returns how many entries matched.
    fn invalidate(&self, key: &CacheKey) -> usize;

    /// Whether the next read of `key` has to go to the network
    fn is_stale(&self, key: &CacheKey) -> bool;
}

/// A type-erased cache entry with timestamps and an invalidation flag
#[derive(Clone)]
pub struct CacheEntry {
    data: Arc<dyn Any + Send + Sync>,
    cached_at: Arc<Mutex<Instant>>,
    last_accessed: Arc<Mutex<Instant>>,
    invalidated: Arc<AtomicBool>,
}

impl CacheEntry {
    pub fn new<T: Clone + Send + Sync + 'static>(data: T) -> Self {
        let now = Instant::now();
        Self {
            data: Arc::new(data),
            cached_at: Arc::new(Mutex::new(now)),
            last_accessed: Arc::new(Mutex::new(now)),
            invalidated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Retrieves the cached data of type `T`, updating the last access time.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        if let Ok(mut last_accessed) = self.last_accessed.lock() {
            *last_accessed = Instant::now();
        }
        self.data.downcast_ref::<T>().cloned()
    }

    /// Resets the entry's age and clears any invalidation.
    pub fn refresh_timestamp(&self) {
        if let Ok(mut cached_at) = self.cached_at.lock() {
            *cached_at = Instant::now();
        }
        self.invalidated.store(false, Ordering::SeqCst);
    }

    /// Marks the entry stale. Returns false if it already was invalidated.
    pub fn mark_invalidated(&self) -> bool {
        !self.invalidated.swap(true, Ordering::SeqCst)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    /// Stale when invalidated or older than `stale_time` (if given)
    pub fn is_stale(&self, stale_time: Option<Duration>) -> bool {
        if self.is_invalidated() {
            return true;
        }
        match stale_time {
            Some(stale_time) => self.age() > stale_time,
            None => false,
        }
    }

    pub fn is_unused_for(&self, duration: Duration) -> bool {
        self.time_since_last_access() > duration
    }

    pub fn time_since_last_access(&self) -> Duration {
        if let Ok(last_accessed) = self.last_accessed.lock() {
            last_accessed.elapsed()
        } else {
            Duration::from_secs(0)
        }
    }

    pub fn age(&self) -> Duration {
        if let Ok(cached_at) = self.cached_at.lock() {
            cached_at.elapsed()
        } else {
            Duration::from_secs(0)
        }
    }
}

/// Shared cache of query results. Clones share the same storage.
#[derive(Clone, Default)]
pub struct QueryCache {
    cache: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
    /// Keys with a fetch in flight, flagged once invalidated during that fetch
    pending: Arc<Mutex<HashMap<CacheKey, bool>>>,
}

fn store_entry<T: Clone + Send + Sync + PartialEq + 'static>(
    cache: &mut HashMap<CacheKey, CacheEntry>,
    key: CacheKey,
    value: T,
) -> bool {
    if let Some(existing_entry) = cache.get(&key) {
        if let Some(existing_value) = existing_entry.get::<T>() {
            if existing_value == value {
                existing_entry.refresh_timestamp();
                debug!(
                    "⏸️ [CACHE-STORE] Value unchanged for key: {}, refreshing timestamp",
                    key
                );
                return false;
            }
        }
    }
    debug!("📊 [CACHE-STORE] Stored data for key: {}", key);
    cache.insert(key, CacheEntry::new(value));
    true
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves a cached result by key, fresh or not.
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        self.cache.lock().ok()?.get(key)?.get::<T>()
    }

    /// Retrieves cached data together with its staleness.
    pub fn get_with_staleness<T: Clone + Send + Sync + 'static>(
        &self,
        key: &CacheKey,
        stale_time: Option<Duration>,
    ) -> Option<(T, bool)> {
        let cache_guard = self.cache.lock().ok()?;
        let entry = cache_guard.get(key)?;
        let data = entry.get::<T>()?;
        Some((data, entry.is_stale(stale_time)))
    }

    /// Stores a value. Returns false when an equal value was already cached, in which case
    /// only the timestamp is refreshed.
    pub fn set<T: Clone + Send + Sync + PartialEq + 'static>(&self, key: CacheKey, value: T) -> bool {
        match self.cache.lock() {
            Ok(mut cache) => store_entry(&mut cache, key, value),
            Err(_) => false,
        }
    }

    /// Records that a fetch of `key` has started.
    pub fn begin_fetch(&self, key: &CacheKey) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(key.clone(), false);
        }
    }

    /// Stores the result of a fetch opened with [`begin_fetch`](Self::begin_fetch).
    ///
    /// If `key` was invalidated while the fetch was in flight, the value is stored but the
    /// entry stays stale: it may predate the write behind that invalidation.
    pub fn finish_fetch<T: Clone + Send + Sync + PartialEq + 'static>(
        &self,
        key: CacheKey,
        value: T,
    ) -> bool {
        let Ok(mut cache) = self.cache.lock() else {
            return false;
        };
        let invalidated_in_flight = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(&key))
            .unwrap_or(false);

        let stored = store_entry(&mut cache, key.clone(), value);
        if invalidated_in_flight {
            if let Some(entry) = cache.get(&key) {
                entry.mark_invalidated();
            }
            debug!(
                "🗑️ [CACHE-STORE] Invalidated while fetching, stored stale: {}",
                key
            );
        }
        stored
    }

    /// Forgets an in-flight fetch that produced no value
    pub fn abandon_fetch(&self, key: &CacheKey) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(key);
        }
    }

    pub fn size(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Removes entries not read for `unused_threshold`.
    pub fn cleanup_unused_entries(&self, unused_threshold: Duration) -> usize {
        if let Ok(mut cache) = self.cache.lock() {
            let initial_size = cache.len();
            cache.retain(|key, entry| {
                let should_keep = !entry.is_unused_for(unused_threshold);
                if !should_keep {
                    debug!("🧹 [CACHE-CLEANUP] Removing unused entry: {}", key);
                }
                should_keep
            });
            let removed = initial_size - cache.len();
            if removed > 0 {
                debug!("🧹 [CACHE-CLEANUP] Removed {} unused entries", removed);
            }
            removed
        } else {
            0
        }
    }

    /// Evicts least recently used entries down to `max_size`.
    pub fn evict_lru_entries(&self, max_size: usize) -> usize {
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() <= max_size {
                return 0;
            }

            let mut entries: Vec<_> = cache.drain().collect();

            // Most recently used last
            entries.sort_by(|(_, a), (_, b)| {
                b.time_since_last_access().cmp(&a.time_since_last_access())
            });

            let to_keep = entries.split_off(entries.len().saturating_sub(max_size));
            let evicted = entries.len();
            cache.extend(to_keep);

            if evicted > 0 {
                debug!(
                    "🗑️ [LRU-EVICT] Evicted {} entries due to cache size limit",
                    evicted
                );
            }
            evicted
        } else {
            0
        }
    }

    /// Drops entries unused for `unused_threshold`, then evicts down to `max_size`.
    pub fn maintain(&self, unused_threshold: Duration, max_size: usize) -> CacheMaintenanceStats {
        CacheMaintenanceStats {
            unused_removed: self.cleanup_unused_entries(unused_threshold),
            lru_evicted: self.evict_lru_entries(max_size),
            final_size: self.size(),
        }
    }
}

impl CacheInvalidator for QueryCache {
    fn invalidate(&self, key: &CacheKey) -> usize {
        let Ok(cache) = self.cache.lock() else {
            return 0;
        };
        if let Ok(mut pending) = self.pending.lock() {
            for (pending_key, invalidated) in pending.iter_mut().filter(|(k, _)| k.matches(key)) {
                debug!("🗑️ [CACHE-INVALIDATE] Fetch in flight for: {}", pending_key);
                *invalidated = true;
            }
        }
        let mut matched = 0;
        for (cached_key, entry) in cache.iter().filter(|(k, _)| k.matches(key)) {
            matched += 1;
            if entry.mark_invalidated() {
                debug!("🗑️ [CACHE-INVALIDATE] Marked stale: {}", cached_key);
            }
        }
        debug!(
            "🗑️ [CACHE-INVALIDATE] Invalidated {} entries under: {}",
            matched, key
        );
        matched
    }

    fn is_stale(&self, key: &CacheKey) -> bool {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(key).map(|entry| entry.is_invalidated()))
            .unwrap_or(true)
    }
}

/// Statistics for cache maintenance operations
#[derive(Debug, Clone, Default)]
pub struct CacheMaintenanceStats {
    pub unused_removed: usize,
    pub lru_evicted: usize,
    pub final_size: usize,
}
