use dashmap::DashMap;
use std::{
    borrow::Borrow,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::Instant;
use tracing::debug;

/// Longest lifetime an entry can get; longer TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Value plus the instant it stops being valid.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Why a lookup produced no value. Callers treat both as "must refetch".
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupMiss {
    #[error("key not found")]
    NotFound,
    #[error("entry expired")]
    Expired,
}

/// Key/value store where every entry carries an absolute expiry.
///
/// Expired entries are evicted lazily on `get`, or in bulk through
/// [`ExpiringStore::purge_expired`]. An expired value is never returned.
/// Clones share the same underlying map.
#[derive(Debug)]
pub struct ExpiringStore<K: Clone + Eq + Hash, V> {
    data: Arc<DashMap<K, CacheEntry<V>>>,
    default_ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl<K, V> ExpiringStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            default_ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Stores `value` for `ttl` (at most [`MAX_TTL`]), replacing any
    /// previous entry for `key`.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.set_until(key, value, Instant::now() + ttl.min(MAX_TTL));
    }

    /// Stores `value` with the store's default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Stores `value` until the given instant. An instant that is not in the
    /// future produces an entry that already reads as expired.
    pub fn set_until(&self, key: K, value: V, expires_at: Instant) {
        self.data.insert(key, CacheEntry { value, expires_at });
    }

    pub fn get<Q>(&self, key: &Q) -> Result<V, LookupMiss>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        let lookup = match self.data.get(key) {
            Some(entry) if !entry.is_expired_at(now) => Ok(entry.value.clone()),
            Some(_) => Err(LookupMiss::Expired),
            None => Err(LookupMiss::NotFound),
        };

        match lookup {
            Ok(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
            Err(miss) => {
                if miss == LookupMiss::Expired {
                    // Only drop the entry if nobody refreshed it in between.
                    self.data.remove_if(key, |_, entry| entry.is_expired_at(now));
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        lookup
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = Instant::now();
        self.data
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    /// Removes `key` unconditionally. Absent keys are not an error.
    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.data.remove(key);
    }

    /// Live entries only.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        let now = Instant::now();
        self.data
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let keys_to_remove: Vec<K> = self
            .data
            .iter()
            .filter_map(|entry| {
                if entry.value().is_expired_at(now) {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect();

        let mut removed = 0;
        for key in keys_to_remove {
            if self
                .data
                .remove_if(&key, |_, entry| entry.is_expired_at(now))
                .is_some()
            {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "purged expired cache entries");
        }

        removed
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl<K, V> Clone for ExpiringStore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            default_ttl: self.default_ttl,
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

/// Hit/miss counters for one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
}

impl StoreStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}
