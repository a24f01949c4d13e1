//! Read-through cache with a TTL and an entry bound.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: Instant,
}

/// Entries are replaced whole, so a reader sees either the previous value
/// or the new one, never a mix.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (entry.cached_at.elapsed() < self.ttl).then(|| entry.data.clone()));

        match lookup {
            Some(Some(data)) => Some(data),
            Some(None) => {
                self.entries
                    .remove_if(key, |_, entry| entry.cached_at.elapsed() >= self.ttl);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, data: V) {
        if self.max_entries == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            while self.entries.len() >= self.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|entry| entry.cached_at)
                    .map(|entry| entry.key().clone());
                match oldest {
                    Some(k) => {
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                data,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.cached_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
