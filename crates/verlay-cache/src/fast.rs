//! Overwrite-only fast-path layer.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// No-TTL map fronting a [`crate::Cache`].
///
/// Entries live until overwritten or invalidated. The bound exists only as a
/// backstop: at capacity an arbitrary entry makes room, there is no recency
/// tracking here.
#[derive(Debug)]
pub struct FastCache<K, V> {
    map: RwLock<HashMap<K, V>>,
    max_size: usize,
}

impl<K, V> FastCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(max_size: usize) -> Self {
        FastCache {
            map: RwLock::new(HashMap::new()),
            max_size,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn put(&self, key: K, value: V) {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        if self.max_size > 0 && map.len() >= self.max_size && !map.contains_key(&key) {
            if let Some(victim) = map.keys().next().cloned() {
                map.remove(&victim);
            }
        }
        map.insert(key, value);
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn invalidate_if(&self, pred: impl Fn(&K) -> bool) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|key, _| !pred(key));
    }

    pub fn clear(&self) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
