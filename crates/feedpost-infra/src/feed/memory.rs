//! In-memory feed source - serves documents published into it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use feedpost_core::error::FetchError;
use feedpost_core::ports::{FeedItems, FeedSource};

use super::parser::parse_feed;

/// Feed source backed by a map of URL to document.
///
/// Unknown URLs answer like a 404.
#[derive(Default)]
pub struct InMemoryFeedSource {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` at `url`, replacing what was there.
    pub async fn publish(&self, url: &str, document: impl Into<Vec<u8>>) {
        self.documents
            .write()
            .await
            .insert(url.to_string(), document.into());
    }
}

#[async_trait]
impl FeedSource for InMemoryFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedItems, FetchError> {
        let bytes = self
            .documents
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(404))?;

        parse_feed(bytes)
    }
}
