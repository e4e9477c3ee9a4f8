use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A thread-safe cache backed by `DashMap`.
///
/// With a `ttl`, entries expire and are lazily evicted on access; without
/// one they live until removed.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    inner: Arc<DashMap<K, (V, Instant)>>,
    ttl: Option<Duration>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    /// Create a new cache with the given time-to-live.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl: Some(ttl),
        }
    }

    /// Create a cache whose entries never expire.
    pub fn unbounded() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl: None,
        }
    }

    fn is_fresh(&self, inserted: &Instant) -> bool {
        self.ttl.map_or(true, |ttl| inserted.elapsed() < ttl)
    }

    /// Get a cached value if it exists and hasn't expired.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.inner.get(key) {
            let (val, inserted) = entry.value();
            if self.is_fresh(inserted) {
                return Some(val.clone());
            }
            // Expired: drop the read guard before removing
            drop(entry);
            self.inner.remove(key);
        }
        None
    }

    /// Insert or update a value in the cache.
    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, (value, Instant::now()));
    }

    /// Remove a specific entry from the cache.
    pub fn remove(&self, key: &K) {
        self.inner.remove(key);
    }

    /// Remove all entries from the cache.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Remove all expired entries.
    pub fn evict_expired(&self) {
        if let Some(ttl) = self.ttl {
            self.inner.retain(|_, (_, inserted)| inserted.elapsed() < ttl);
        }
    }

    /// Keep only the entries whose key satisfies `keep`.
    pub fn retain_keys(&self, mut keep: impl FnMut(&K) -> bool) {
        self.inner.retain(|k, _| keep(k));
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CacheStore trait + InMemoryStore + NoCache
// ---------------------------------------------------------------------------

/// Pluggable process-wide cache contract: `read` a key (miss is `None`) and
/// `write` one back.
///
/// Stores are injected where they are needed rather than reached through a
/// global. Concurrent access is the store's responsibility.
pub trait CacheStore<V>: Send + Sync + 'static {
    fn read(&self, key: &str) -> Option<V>;
    fn write(&self, key: &str, value: V);
    fn remove(&self, key: &str);
    fn clear(&self);
    fn remove_by_prefix(&self, prefix: &str);
}

/// Default in-memory store backed by [`TtlCache`].
#[derive(Clone)]
pub struct InMemoryStore<V> {
    inner: TtlCache<String, V>,
}

impl<V: Clone> InMemoryStore<V> {
    /// A store whose entries never expire.
    pub fn new() -> Self {
        Self {
            inner: TtlCache::unbounded(),
        }
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: TtlCache::new(ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<V: Clone> Default for InMemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync + 'static> CacheStore<V> for InMemoryStore<V> {
    fn read(&self, key: &str) -> Option<V> {
        self.inner.get(&key.to_string())
    }

    fn write(&self, key: &str, value: V) {
        self.inner.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.inner.remove(&key.to_string());
    }

    fn clear(&self) {
        self.inner.clear();
    }

    fn remove_by_prefix(&self, prefix: &str) {
        self.inner.retain_keys(|k| !k.starts_with(prefix));
    }
}

/// A store that never holds anything; every read is a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<V> CacheStore<V> for NoCache {
    fn read(&self, _key: &str) -> Option<V> {
        None
    }

    fn write(&self, _key: &str, _value: V) {}

    fn remove(&self, _key: &str) {}

    fn clear(&self) {}

    fn remove_by_prefix(&self, _prefix: &str) {}
}
