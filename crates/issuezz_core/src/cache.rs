//! A small in-memory memo for AI replies, keyed by the serialized request.

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// TTL and size bound of a [`ResponseCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// A zero TTL disables caching.
    pub ttl: Duration,
    /// Most entries kept; the least recently used one is evicted past it.
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

pub struct ResponseCache<V> {
    ttl: Duration,
    entries: Mutex<LruCache<String, (Instant, V)>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(settings: CacheSettings) -> Self {
        let capacity = NonZeroUsize::new(settings.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl: settings.ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// The request's JSON form; `None` if it cannot be serialized.
    pub fn key_for<T: Serialize>(request: &T) -> Option<String> {
        serde_json::to_string(request).ok()
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        if !self.is_enabled() {
            return None;
        }
        let mut entries = self.entries.lock().await;
        let fresh = match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => None,
            None => return None,
        };
        match fresh {
            Some(value) => {
                debug!("Cache hit ({} entries)", entries.len());
                Some(value)
            }
            None => {
                entries.pop(key);
                None
            }
        }
    }

    pub async fn insert(&self, key: String, value: V) {
        if !self.is_enabled() {
            return;
        }
        self.entries.lock().await.put(key, (Instant::now(), value));
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
