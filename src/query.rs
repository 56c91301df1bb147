//! # Queries and the Query Client
//!
//! A [`Query`] describes one cacheable remote read: how to run it and which [`CacheKey`]
//! it is stored under. The [`QueryClient`] bundles the [`QueryCache`] with the
//! [`RefreshRegistry`] and is what views and coordinators share. It is handed to them
//! explicitly (Dioxus context in the UI, a plain argument everywhere else).
//!
//! ```rust,no_run
//! use dioxus_studio_reports::prelude::*;
//!
//! # async fn run(api: HttpClient, params: InfraMonitoringParams) {
//! let client = QueryClient::new();
//! let series = client.fetch_query(&InfraMonitoringQuery::new(api), params).await;
//! # }
//! ```

use std::{fmt::Debug, future::Future, time::Duration};
use tracing::debug;

use crate::{
    cache::{CacheInvalidator, CacheMaintenanceStats, QueryCache},
    keys::CacheKey,
    platform::{DEFAULT_MAX_CACHE_SIZE, DEFAULT_UNUSED_THRESHOLD},
    refresh::{RefreshRegistry, Revalidation},
};

/// A cacheable async read
pub trait Query<Param = ()>: Clone + 'static
where
    Param: Clone + PartialEq + Debug + 'static,
{
    /// The type of data returned on success
    type Output: Clone + PartialEq + Send + Sync + 'static;
    /// The type of error returned on failure
    type Error: Clone + 'static;

    /// Perform the read
    fn run(&self, param: Param) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Cache key for this query with the given parameters. Equal parameters must give
    /// equal keys.
    fn key(&self, param: &Param) -> CacheKey;

    /// Age after which cached data is refetched (None uses the client default)
    fn stale_time(&self) -> Option<Duration> {
        None
    }
}

/// Shared handle to the query cache and refresh registry
#[derive(Clone)]
pub struct QueryClient {
    cache: QueryCache,
    refresh_registry: RefreshRegistry,
    default_stale_time: Option<Duration>,
    max_cache_size: usize,
    unused_threshold: Duration,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self {
            cache: QueryCache::new(),
            refresh_registry: RefreshRegistry::new(),
            default_stale_time: None,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            unused_threshold: DEFAULT_UNUSED_THRESHOLD,
        }
    }
}

/// Releases the fetch claim on a key, also when the fetching future is dropped early
struct FetchClaim<'a> {
    client: &'a QueryClient,
    key: CacheKey,
}

impl Drop for FetchClaim<'_> {
    fn drop(&mut self) {
        self.client.cache.abandon_fetch(&self.key);
        self.client.refresh_registry.complete_revalidation(&self.key);
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.default_stale_time = Some(stale_time);
        self
    }

    /// Size [`maintain`](Self::maintain) evicts the cache down to
    pub fn with_max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.max_cache_size = max_cache_size;
        self
    }

    /// Stale time applied to `query`: its own, or the client default
    pub fn stale_time_for<Q, Param>(&self, query: &Q) -> Option<Duration>
    where
        Q: Query<Param>,
        Param: Clone + PartialEq + Debug + 'static,
    {
        query.stale_time().or(self.default_stale_time)
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn refresh_registry(&self) -> &RefreshRegistry {
        &self.refresh_registry
    }

    /// Returns cached data when fresh, otherwise runs the query and caches a success.
    ///
    /// A read of a key that is already being fetched waits for that fetch and returns
    /// its cached result. Errors are never cached: the next read retries, including any
    /// read that was waiting on the failed fetch. A result whose key was invalidated
    /// while it was fetched is returned but cached stale.
    pub async fn fetch_query<Q, Param>(
        &self,
        query: &Q,
        param: Param,
    ) -> Result<Q::Output, Q::Error>
    where
        Q: Query<Param>,
        Param: Clone + PartialEq + Debug + 'static,
    {
        let key = query.key(&param);
        let stale_time = self.stale_time_for::<Q, Param>(query);

        let _claim = loop {
            if let Some((data, false)) = self.cache.get_with_staleness::<Q::Output>(&key, stale_time)
            {
                debug!("📦 [QUERY] Cache hit for: {}", key);
                return Ok(data);
            }
            match self.refresh_registry.start_revalidation(&key) {
                Revalidation::Started => {
                    break FetchClaim {
                        client: self,
                        key: key.clone(),
                    };
                }
                Revalidation::InProgress(done) => {
                    debug!("⏳ [QUERY] Waiting for in-flight fetch: {}", key);
                    let _ = done.await;
                }
            }
        };

        debug!("🔄 [QUERY] Fetching: {}", key);
        self.cache.begin_fetch(&key);
        let result = query.run(param).await;

        match &result {
            Ok(data) => {
                self.cache.finish_fetch(key, data.clone());
            }
            Err(_) => debug!("❌ [QUERY] Fetch failed for: {}", key),
        }
        result
    }

    pub fn is_fetching(&self, key: &CacheKey) -> bool {
        self.refresh_registry.is_revalidation_in_progress(key)
    }

    pub fn get_query_data<T: Clone + Send + Sync + 'static>(&self, key: &CacheKey) -> Option<T> {
        self.cache.get(key)
    }

    pub fn set_query_data<T: Clone + Send + Sync + PartialEq + 'static>(
        &self,
        key: CacheKey,
        value: T,
    ) {
        self.cache.set(key.clone(), value);
        self.refresh_registry.trigger_refresh(&key);
    }

    /// Alias of [`CacheInvalidator::invalidate`]
    pub fn invalidate_queries(&self, key: &CacheKey) -> usize {
        self.invalidate(key)
    }

    /// Bounds the cache and forgets views that are gone
    pub fn maintain(&self) -> CacheMaintenanceStats {
        let stats = self
            .cache
            .maintain(self.unused_threshold, self.max_cache_size);
        let dropped_keys = self.refresh_registry.cleanup();
        debug!(
            "🧹 [QUERY] Maintenance: {} unused, {} evicted, {} entries left, {} subscriptions dropped",
            stats.unused_removed, stats.lru_evicted, stats.final_size, dropped_keys
        );
        stats
    }
}

impl CacheInvalidator for QueryClient {
    /// Marks matching entries stale and re-runs the views reading them.
    fn invalidate(&self, key: &CacheKey) -> usize {
        let matched = self.cache.invalidate(key);
        self.refresh_registry.trigger_refresh(key);
        matched
    }

    fn is_stale(&self, key: &CacheKey) -> bool {
        self.cache.is_stale(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Clone, Default)]
    struct CountingQuery {
        runs: Arc<AtomicUsize>,
        fail: bool,
        latency: Option<Duration>,
        stale_time: Option<Duration>,
    }

    impl Query<String> for CountingQuery {
        type Output = usize;
        type Error = String;

        async fn run(&self, param: String) -> Result<usize, String> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.fail {
                Err(format!("{param} failed"))
            } else {
                Ok(n)
            }
        }

        fn key(&self, param: &String) -> CacheKey {
            CacheKey::new("counting").push(param.as_str())
        }

        fn stale_time(&self) -> Option<Duration> {
            self.stale_time
        }
    }

    fn slow_query() -> CountingQuery {
        CountingQuery {
            latency: Some(Duration::from_millis(100)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fresh_data_is_served_from_cache() {
        let client = QueryClient::new();
        let query = CountingQuery::default();

        assert_eq!(client.fetch_query(&query, "a".to_string()).await, Ok(1));
        assert_eq!(client.fetch_query(&query, "a".to_string()).await, Ok(1));
        assert_eq!(query.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch_on_next_read() {
        let client = QueryClient::new();
        let query = CountingQuery::default();
        client.fetch_query(&query, "a".to_string()).await.unwrap();

        assert_eq!(client.invalidate_queries(&CacheKey::new("counting")), 1);
        assert!(client.is_stale(&query.key(&"a".to_string())));
        assert_eq!(client.fetch_query(&query, "a".to_string()).await, Ok(2));
        assert!(!client.is_stale(&query.key(&"a".to_string())));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let client = QueryClient::new();
        let query = CountingQuery {
            fail: true,
            ..Default::default()
        };

        assert!(client.fetch_query(&query, "a".to_string()).await.is_err());
        assert!(client.fetch_query(&query, "a".to_string()).await.is_err());
        assert_eq!(query.runs.load(Ordering::SeqCst), 2);
        assert_eq!(client.cache().size(), 0);
        assert!(!client.is_fetching(&query.key(&"a".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_during_fetch_keeps_entry_stale() {
        let client = QueryClient::new();
        let query = slow_query();
        let key = query.key(&"a".to_string());

        let (first, _) = tokio::join!(client.fetch_query(&query, "a".to_string()), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            client.invalidate(&CacheKey::new("counting"));
        });

        assert_eq!(first, Ok(1));
        assert!(client.is_stale(&key));
        assert_eq!(client.fetch_query(&query, "a".to_string()).await, Ok(2));
        assert_eq!(query.runs.load(Ordering::SeqCst), 2);
        assert!(!client.is_stale(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reads_share_one_fetch() {
        let client = QueryClient::new();
        let query = slow_query();

        let (a, b) = tokio::join!(
            client.fetch_query(&query, "a".to_string()),
            client.fetch_query(&query, "a".to_string())
        );

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(query.runs.load(Ordering::SeqCst), 1);
        assert!(!client.is_fetching(&query.key(&"a".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_of_other_keys_run_concurrently() {
        let client = QueryClient::new();
        let query = slow_query();
        let started = tokio::time::Instant::now();

        let (a, b) = tokio::join!(
            client.fetch_query(&query, "a".to_string()),
            client.fetch_query(&query, "b".to_string())
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(query.runs.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_fetch_releases_waiters() {
        let client = QueryClient::new();
        let query = slow_query();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            client.fetch_query(&query, "a".to_string()),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!client.is_fetching(&query.key(&"a".to_string())));

        assert_eq!(client.fetch_query(&query, "a".to_string()).await, Ok(2));
    }

    #[test]
    fn test_client_default_stale_time_applies_to_queries() {
        let client = QueryClient::new().with_stale_time(Duration::from_secs(30));
        let inherits = CountingQuery::default();
        let overrides = CountingQuery {
            stale_time: Some(Duration::from_secs(5)),
            ..Default::default()
        };

        assert_eq!(
            client.stale_time_for::<_, String>(&inherits),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            client.stale_time_for::<_, String>(&overrides),
            Some(Duration::from_secs(5))
        );
        assert_eq!(QueryClient::new().stale_time_for::<_, String>(&inherits), None);
    }

    #[tokio::test]
    async fn test_maintain_bounds_cache_size() {
        let client = QueryClient::new().with_max_cache_size(2);
        let query = CountingQuery::default();
        for param in ["a", "b", "c"] {
            client.fetch_query(&query, param.to_string()).await.unwrap();
        }
        assert_eq!(client.cache().size(), 3);

        let stats = client.maintain();
        assert_eq!(stats.lru_evicted, 1);
        assert_eq!(client.cache().size(), 2);
    }

    #[test]
    fn test_invalidate_triggers_refresh() {
        let client = QueryClient::new();
        let key = CacheKey::new("counting").push("a");
        client.invalidate(&key);
        assert_eq!(client.refresh_registry().get_refresh_count(&key), 1);
    }
}
