//! Cache module for incremental regeneration
//!
//! Rendered results are kept for a revalidation window. A lookup only
//! returns entries younger than the window, so a stale page is recomputed
//! on the next request that needs it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A cached value with the instant it was stored
#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    stored_at: Instant,
}

/// Time-bounded cache keyed by page identifier
#[derive(Debug)]
pub struct RevalidationCache<V> {
    window: Duration,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> RevalidationCache<V> {
    /// Create a cache whose entries stay fresh for `window`
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.window {
            Some(entry.value.clone())
        } else {
            tracing::debug!("Cache entry {} is stale", key);
            None
        }
    }

    /// Store a value, replacing any previous entry
    pub async fn insert(&self, key: impl Into<String>, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.write().await.insert(
            key.into(),
            CacheEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// Drop the entry for `key`; returns whether one existed
    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    /// Drop every stale entry; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.window);
        before - entries.len()
    }

    /// Number of stored entries, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
