//! Caching infrastructure for imported meals
//!
//! The meal cache is optional infrastructure sitting in front of the document
//! store. Every backend implements the narrow [`MealCache`] interface; call
//! sites only ever talk to [`ReadThroughCache`], which is a no-op when no cache
//! is configured and turns backend failures into misses.
//!
//! ## Backends
//!
//! - **Memory Cache**: in-process TTL cache (`CACHE_URL=memory://`)
//! - **Redis Cache**: shared cache for multi-instance deployments (`CACHE_URL=redis://...`)
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use meal_prep::cache::{MemoryCache, ReadThroughCache};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let cache = ReadThroughCache::new(Arc::new(MemoryCache::<String, Vec<u8>>::new()));
//! cache.populate("meal:52772", b"{}".to_vec()).await;
//! assert!(cache.lookup("meal:52772").await.is_some());
//! # }
//! ```

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::config::{CacheBackend, CacheConfig, MEAL_CACHE_TTL};
use crate::errors::{AppError, AppResult};
use crate::observability::{record_cache_lookup, record_cache_populate_failure};

/// Cache key for an imported meal
pub fn meal_cache_key(id_meal: &str) -> String {
    format!("meal:{}", id_meal)
}

/// A byte-oriented cache backend for serialized meal documents
#[async_trait]
pub trait MealCache: Send + Sync {
    /// Fetch the bytes stored under `key`, `None` when absent or expired
    async fn lookup(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl`
    async fn populate(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()>;
}

/// Generic cache entry with expiration time
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached value
    pub value: T,
    /// When this entry expires
    pub expires_at: Instant,
}

impl<T> CacheEntry<T> {
    /// Create a new cache entry
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    /// Check if this entry has expired
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Thread-safe in-memory TTL cache
///
/// Expired entries are swept on every insert, so the map never holds more
/// than the live entries plus those that expired since the last write.
pub struct MemoryCache<K, V> {
    data: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Create a new memory cache
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Get a live value from the cache
    ///
    /// A hit leaves the entry's expiry untouched.
    pub fn get(&self, key: &K) -> Option<V> {
        self.data
            .read()
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Insert a value, replacing any previous entry and its expiry
    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        let mut data = self.data.write();

        let initial_len = data.len();
        data.retain(|_, entry| !entry.is_expired());
        let removed = initial_len - data.len();
        if removed > 0 {
            debug!("Cache sweep removed {} expired entries", removed);
        }

        data.insert(key, CacheEntry::new(value, ttl));
    }
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MealCache for MemoryCache<String, Vec<u8>> {
    async fn lookup(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.get(&key.to_string()))
    }

    async fn populate(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        self.insert(key.to_string(), value, ttl);
        Ok(())
    }
}

/// Redis-backed meal cache
///
/// `ConnectionManager` is cheap to clone and reconnects on its own once the
/// initial connection has been established.
#[derive(Clone)]
pub struct RedisMealCache {
    manager: ConnectionManager,
}

impl RedisMealCache {
    /// Connect to Redis and verify the server answers `PING`
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cache` if the URL is invalid, the server cannot be
    /// reached within `timeout`, or it does not answer.
    pub async fn connect(url: &str, timeout: Duration) -> AppResult<Self> {
        let client = redis::Client::open(url)?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(timeout)
            .set_response_timeout(timeout)
            .set_number_of_retries(1);

        let mut manager = tokio::time::timeout(
            timeout,
            ConnectionManager::new_with_config(client, manager_config),
        )
        .await
        .map_err(|_| AppError::Cache(format!("connection timed out after {:?}", timeout)))??;

        let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
        debug!(reply = %pong, "Redis answered PING");

        Ok(Self { manager })
    }
}

#[async_trait]
impl MealCache for RedisMealCache {
    async fn lookup(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut conn = self.manager.clone();
        let data: Option<Vec<u8>> = conn.get(key).await?;
        Ok(data)
    }

    async fn populate(&self, key: &str, value: Vec<u8>, ttl: Duration) -> AppResult<()> {
        let mut conn = self.manager.clone();
        // SETEX stores the value and its expiry atomically
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }
}

/// Optional read-through cache handed to the meal importer
///
/// Both operations are infallible: with no backend they do nothing, and
/// backend failures are logged and reported as a miss. Every populate uses
/// [`MEAL_CACHE_TTL`].
#[derive(Clone)]
pub struct ReadThroughCache {
    backend: Option<Arc<dyn MealCache>>,
}

impl ReadThroughCache {
    /// A cache backed by `backend`
    pub fn new(backend: Arc<dyn MealCache>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Whether a backend is configured
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Look up `key`; errors count as a miss
    pub async fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        let backend = self.backend.as_ref()?;

        match backend.lookup(key).await {
            Ok(found) => {
                record_cache_lookup(found.is_some());
                found
            }
            Err(e) => {
                debug!(error = %e, key = %key, "Cache lookup failed, treating as miss");
                record_cache_lookup(false);
                None
            }
        }
    }

    /// Best-effort write of `value` under `key`
    pub async fn populate(&self, key: &str, value: Vec<u8>) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };

        if let Err(e) = backend.populate(key, value, MEAL_CACHE_TTL).await {
            debug!(error = %e, key = %key, "Cache populate failed, ignoring");
            record_cache_populate_failure();
        }
    }
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("enabled", &self.is_enabled())
            .field("ttl", &MEAL_CACHE_TTL)
            .finish()
    }
}

/// Build the meal cache selected by `config`
///
/// An unreachable Redis is not an error: the process runs without a cache.
pub async fn connect_cache(config: &CacheConfig) -> ReadThroughCache {
    match config.backend() {
        CacheBackend::Disabled => {
            info!("No CACHE_URL configured, meal cache disabled");
            ReadThroughCache::disabled()
        }
        CacheBackend::Memory => {
            info!("Using in-process meal cache");
            ReadThroughCache::new(Arc::new(MemoryCache::<String, Vec<u8>>::new()))
        }
        CacheBackend::Redis(url) => {
            match RedisMealCache::connect(&url, config.connect_timeout()).await {
                Ok(cache) => {
                    info!("Connected to Redis meal cache");
                    ReadThroughCache::new(Arc::new(cache))
                }
                Err(e) => {
                    warn!(error = %e, "Meal cache unreachable, continuing with cache disabled");
                    ReadThroughCache::disabled()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct BrokenCache;

    #[async_trait]
    impl MealCache for BrokenCache {
        async fn lookup(&self, _key: &str) -> AppResult<Option<Vec<u8>>> {
            Err(AppError::Cache("connection reset".to_string()))
        }

        async fn populate(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> AppResult<()> {
            Err(AppError::Cache("connection reset".to_string()))
        }
    }

    #[test]
    fn test_memory_cache_basic_operations() {
        let cache = MemoryCache::new();

        cache.insert("key1", "value1", Duration::from_secs(60));
        assert_eq!(cache.get(&"key1"), Some("value1"));
        assert_eq!(cache.get(&"key2"), None);

        cache.insert("key1", "value2", Duration::from_secs(60));
        assert_eq!(cache.get(&"key1"), Some("value2"));
    }

    #[test]
    fn test_memory_cache_expiration() {
        let cache = MemoryCache::new();

        cache.insert("key1", "value1", Duration::from_millis(10));
        assert_eq!(cache.get(&"key1"), Some("value1"));

        thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get(&"key1"), None);
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let cache = MemoryCache::new();

        cache.insert("key1", "value1", Duration::from_millis(10));
        cache.insert("key2", "value2", Duration::from_secs(60));
        thread::sleep(Duration::from_millis(20));

        cache.insert("key3", "value3", Duration::from_secs(60));

        let data = cache.data.read();
        assert_eq!(data.len(), 2);
        assert!(!data.contains_key(&"key1"));
        assert!(data.contains_key(&"key2"));
    }

    #[test]
    fn test_hit_does_not_extend_expiry() {
        let cache = MemoryCache::new();

        cache.insert("key1", "value1", Duration::from_millis(40));
        thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"key1"), Some("value1"));

        thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"key1"), None);
    }

    #[test]
    fn test_tls_redis_urls_are_supported() {
        assert!(redis::Client::open("rediss://cache.internal:6380").is_ok());
    }

    #[test]
    fn test_meal_cache_key() {
        assert_eq!(meal_cache_key("52772"), "meal:52772");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = ReadThroughCache::disabled();
        assert!(!cache.is_enabled());

        cache.populate("meal:1", b"{}".to_vec()).await;
        assert_eq!(cache.lookup("meal:1").await, None);
    }

    #[tokio::test]
    async fn test_read_through_cache_round_trip() {
        let cache = ReadThroughCache::new(Arc::new(MemoryCache::<String, Vec<u8>>::new()));
        assert!(cache.is_enabled());

        assert_eq!(cache.lookup("meal:1").await, None);
        cache.populate("meal:1", b"{\"idMeal\":\"1\"}".to_vec()).await;
        assert_eq!(
            cache.lookup("meal:1").await,
            Some(b"{\"idMeal\":\"1\"}".to_vec())
        );
    }

    #[derive(Default)]
    struct RecordingCache {
        ttls: parking_lot::Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl MealCache for RecordingCache {
        async fn lookup(&self, _key: &str) -> AppResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn populate(&self, _key: &str, _value: Vec<u8>, ttl: Duration) -> AppResult<()> {
            self.ttls.lock().push(ttl);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_populate_always_uses_meal_ttl() {
        let backend = Arc::new(RecordingCache::default());
        let cache = ReadThroughCache::new(backend.clone());

        cache.populate("meal:1", b"{}".to_vec()).await;
        cache.populate("meal:2", b"{}".to_vec()).await;

        assert_eq!(*backend.ttls.lock(), vec![MEAL_CACHE_TTL, MEAL_CACHE_TTL]);
    }

    #[tokio::test]
    async fn test_backend_failures_are_swallowed() {
        let cache = ReadThroughCache::new(Arc::new(BrokenCache));

        cache.populate("meal:1", b"{}".to_vec()).await;
        assert_eq!(cache.lookup("meal:1").await, None);
    }

    #[tokio::test]
    async fn test_connect_cache_selects_backend() {
        let disabled = connect_cache(&CacheConfig::default()).await;
        assert!(!disabled.is_enabled());

        let memory = connect_cache(&CacheConfig {
            url: Some("memory://".to_string()),
            ..CacheConfig::default()
        })
        .await;
        assert!(memory.is_enabled());
    }

    #[tokio::test]
    async fn test_unreachable_redis_disables_cache() {
        let cache = connect_cache(&CacheConfig {
            url: Some("redis://127.0.0.1:1".to_string()),
            connect_timeout_ms: 200,
        })
        .await;
        assert!(!cache.is_enabled());
    }
}
