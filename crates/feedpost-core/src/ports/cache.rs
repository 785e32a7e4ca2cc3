use async_trait::async_trait;
use std::time::Duration;

/// Expiring key set. Backs the token revocation list, so keys carry no value
/// and never outlive their TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Keep `key` until `ttl` elapses, replacing any earlier expiry.
    async fn insert(&self, key: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Whether `key` is present and not yet expired.
    async fn contains(&self, key: &str) -> bool;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}
