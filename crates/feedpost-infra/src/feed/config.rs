use std::env;
use std::time::Duration;

/// Feed ingestion settings.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed to ingest; scheduled ingestion is off without one.
    pub url: Option<String>,
    pub timeout: Duration,
    /// Items upserted at once.
    pub concurrency: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(30),
            concurrency: 1,
        }
    }
}

impl FeedConfig {
    /// Read `RSS_FEED_URL`, `RSS_FETCH_TIMEOUT_SECS` and `RSS_INGEST_CONCURRENCY`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: env::var("RSS_FEED_URL")
                .ok()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            timeout: env::var("RSS_FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            concurrency: env::var("RSS_INGEST_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.concurrency)
                .max(1),
        }
    }
}
