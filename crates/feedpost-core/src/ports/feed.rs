//! Feed source port - where ingestion gets its items from.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// One `channel/item` element as found in the document.
///
/// Missing child elements are empty strings; `guid` is kept optional so the
/// pipeline can tell "absent" from "present".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFeedItem {
    pub guid: Option<String>,
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

/// Lazy, single-pass sequence of items in document order.
pub type FeedItems = Box<dyn Iterator<Item = Result<RawFeedItem, FetchError>> + Send>;

/// Retrieves and opens a feed document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch `url` and return its items. Every call fetches again.
    async fn fetch(&self, url: &str) -> Result<FeedItems, FetchError>;
}
