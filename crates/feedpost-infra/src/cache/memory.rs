//! In-memory expiring key set.
//!
//! Note: Data is lost on process restart, so revoked tokens become valid
//! again until they expire on their own.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use feedpost_core::ports::{Cache, CacheError};

/// Keys mapped to their expiry, behind an async RwLock.
#[derive(Default)]
pub struct InMemoryCache {
    store: RwLock<HashMap<String, Instant>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn insert(&self, key: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        // Sweep on write so keys that are never looked up again still go away.
        store.retain(|_, expires_at| *expires_at > now);
        store.insert(key.to_string(), now + ttl);

        Ok(())
    }

    async fn contains(&self, key: &str) -> bool {
        self.store
            .read()
            .await
            .get(key)
            .is_some_and(|expires_at| *expires_at > Instant::now())
    }
}
