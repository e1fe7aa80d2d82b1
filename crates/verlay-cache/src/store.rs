//! TTL + LRU bounded store.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    created_at: Instant,
    accessed_at: Instant,
    ttl: Option<Duration>,
    access_count: u64,
}

impl<V> Entry<V> {
    fn new(value: V, ttl: Option<Duration>, now: Instant) -> Self {
        Entry {
            value,
            created_at: now,
            accessed_at: now,
            ttl,
            access_count: 0,
        }
    }

    // A zero TTL means "never expires", same as no TTL at all. Expiry is
    // measured from creation; access bumps never refresh it.
    fn is_expired(&self, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) if !ttl.is_zero() => now.duration_since(self.created_at) > ttl,
            _ => false,
        }
    }
}

/// Point-in-time counters for a [`Cache`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
    pub max_size: usize,
    pub hit_ratio: f64,
}

/// A bounded key-value store with lazy TTL expiry and LRU eviction.
///
/// Readers take the shared lock to probe; the access-time bump a hit requires
/// is a mutation, so the read re-acquires the lock exclusively and re-checks.
/// An entry evicted between the two acquisitions turns into a miss, which is
/// a valid outcome rather than a failure.
#[derive(Debug)]
pub struct Cache<K, V> {
    map: RwLock<HashMap<K, Entry<V>>>,
    max_size: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_size: usize) -> Self {
        Cache {
            map: RwLock::new(HashMap::new()),
            max_size,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, Entry<V>>> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, Entry<V>>> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();

        let probe_hit = {
            let map = self.read();
            match map.get(key) {
                Some(entry) => !entry.is_expired(now),
                None => false,
            }
        };

        if !probe_hit {
            // Expired entries are reaped by the exclusive pass below.
            let mut map = self.write();
            let expired = map.get(key).is_some_and(|entry| entry.is_expired(now));
            if expired {
                map.remove(key);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let mut map = self.write();
        match map.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.accessed_at = now;
                entry.access_count += 1;
                let value = entry.value.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite. `ttl` of `None` (or zero) never expires.
    ///
    /// Inserting a distinct key into a full cache first evicts exactly one
    /// entry, the one with the oldest access time.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let mut map = self.write();

        if let Some(existing) = map.get_mut(&key) {
            *existing = Entry::new(value, ttl, now);
            return;
        }

        if self.max_size > 0 && map.len() >= self.max_size {
            match oldest_key(&map) {
                Some(victim) => {
                    map.remove(&victim);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                None => warn!("cache at capacity but no entry eligible for eviction"),
            }
        }

        map.insert(key, Entry::new(value, ttl, now));
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.write().remove(key).is_some()
    }

    /// Drop every entry whose key matches `pred`.
    pub fn invalidate_if(&self, pred: impl Fn(&K) -> bool) {
        self.write().retain(|key, _| !pred(key));
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let accesses = hits + misses;
        CacheStats {
            hits,
            misses,
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.len(),
            max_size: self.max_size,
            hit_ratio: if accesses == 0 {
                0.0
            } else {
                hits as f64 / accesses as f64
            },
        }
    }
}

// Linear scan; first-found wins ties, strictly-older replaces.
fn oldest_key<K: Clone, V>(map: &HashMap<K, Entry<V>>) -> Option<K> {
    let mut oldest: Option<(&K, Instant)> = None;
    for (key, entry) in map {
        match oldest {
            Some((_, at)) if entry.accessed_at >= at => {}
            _ => oldest = Some((key, entry.accessed_at)),
        }
    }
    oldest.map(|(key, _)| key.clone())
}
