use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clock::Clock;

/// Default capacity of [`InMemoryCache`].
pub const DEFAULT_CAPACITY: usize = 512;

/// Trait for a cache of fetched resource bodies keyed by string.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn insert(&self, key: String, value: String);
    async fn contains_key(&self, key: &str) -> bool;
    async fn remove(&self, key: &str) -> Option<String>;
    async fn clear(&self);
    async fn len(&self) -> usize;
}

/// Builds the default cache key for a URL on a given day.
pub fn daily_key(url: &str, day: NaiveDate) -> String {
    format!("{}@{}", url, day.format("%Y-%m-%d"))
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: String,
    stored_on: NaiveDate,
    last_used: u64,
}

#[derive(Debug, Default)]
struct CacheData {
    data: HashMap<String, CacheEntry>,
    tick: u64,
}

impl CacheData {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .data
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.data.remove(&key);
            tracing::debug!("Evicted least recently used cache entry {}", key);
        }
    }
}

/// Bounded in-memory cache.
///
/// Entries are evicted least-recently-used once `capacity` is reached, and an
/// entry stored on an earlier calendar day than the clock's current day is
/// treated as absent.
#[derive(Clone)]
pub struct InMemoryCache {
    cache: Arc<RwLock<CacheData>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(CacheData::default())),
            capacity: capacity.max(1),
            clock,
        }
    }

    #[allow(dead_code)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let today = self.clock.today();
        let mut guard = self.cache.write().await;
        let tick = guard.next_tick();

        let stale = match guard.data.get_mut(key) {
            Some(entry) if entry.stored_on == today => {
                entry.last_used = tick;
                return Some(entry.body.clone());
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            guard.data.remove(key);
            tracing::debug!("Dropped cache entry {} stored on an earlier day", key);
        }
        None
    }

    async fn insert(&self, key: String, value: String) {
        let stored_on = self.clock.today();
        let mut guard = self.cache.write().await;
        let last_used = guard.next_tick();

        if !guard.data.contains_key(&key) && guard.data.len() >= self.capacity {
            guard.evict_lru();
        }
        guard.data.insert(
            key,
            CacheEntry {
                body: value,
                stored_on,
                last_used,
            },
        );
    }

    async fn contains_key(&self, key: &str) -> bool {
        let today = self.clock.today();
        self.cache
            .read()
            .await
            .data
            .get(key)
            .is_some_and(|entry| entry.stored_on == today)
    }

    async fn remove(&self, key: &str) -> Option<String> {
        self.cache.write().await.data.remove(key).map(|entry| entry.body)
    }

    async fn clear(&self) {
        self.cache.write().await.data.clear();
    }

    async fn len(&self) -> usize {
        self.cache.read().await.data.len()
    }
}
