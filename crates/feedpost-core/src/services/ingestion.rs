//! RSS ingestion - fetch a feed and upsert every item by guid.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Serialize, Serializer};

use crate::domain::{PostContent, UpsertAction, parse_timestamp};
use crate::error::{FetchError, ItemProcessingError};
use crate::ports::{FeedSource, PostRepository, RawFeedItem};

/// A feed item that could not be stored.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    /// 1-based position of the item in the document.
    pub position: usize,
    pub guid: Option<String>,
    #[serde(serialize_with = "serialize_display")]
    pub error: ItemProcessingError,
}

/// Outcome of one ingestion run, for the caller to log or persist.
///
/// Each processed item lands in exactly one of the lists.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub feed_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl IngestionReport {
    fn new(feed_url: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            feed_url: feed_url.to_string(),
            started_at,
            finished_at: started_at,
            created: Vec::new(),
            updated: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn processed(&self) -> usize {
        self.created.len() + self.updated.len() + self.unchanged.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    fn record(&mut self, outcome: ItemOutcome) {
        match outcome.result {
            Ok((guid, UpsertAction::Created)) => self.created.push(guid),
            Ok((guid, UpsertAction::Updated)) => self.updated.push(guid),
            Ok((guid, UpsertAction::Unchanged)) => self.unchanged.push(guid),
            Err(error) => {
                tracing::warn!(
                    position = outcome.position,
                    guid = outcome.guid.as_deref().unwrap_or(""),
                    error = %error,
                    "Skipping feed item"
                );
                self.failed.push(ItemFailure {
                    position: outcome.position,
                    guid: outcome.guid,
                    error,
                });
            }
        }
    }
}

impl fmt::Display for IngestionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items from {}: {} created, {} updated, {} unchanged, {} failed",
            self.processed(),
            self.feed_url,
            self.created.len(),
            self.updated.len(),
            self.unchanged.len(),
            self.failed.len()
        )
    }
}

struct ItemOutcome {
    position: usize,
    guid: Option<String>,
    result: Result<(String, UpsertAction), ItemProcessingError>,
}

/// Fetches a feed and upserts its items into the post repository.
pub struct IngestionPipeline {
    posts: Arc<dyn PostRepository>,
    source: Arc<dyn FeedSource>,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(posts: Arc<dyn PostRepository>, source: Arc<dyn FeedSource>) -> Self {
        Self {
            posts,
            source,
            concurrency: 1,
        }
    }

    /// Upsert up to `concurrency` items at once. Results are still recorded in
    /// document order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one ingestion of `feed_url`.
    ///
    /// Fails only when the feed cannot be fetched or parsed; item-level
    /// problems are collected in the report.
    pub async fn ingest(&self, feed_url: &str) -> Result<IngestionReport, FetchError> {
        let started_at = Utc::now();
        tracing::info!(feed_url = %feed_url, "Starting feed ingestion");

        let items = self.source.fetch(feed_url).await.inspect_err(|e| {
            tracing::error!(feed_url = %feed_url, error = %e, "Feed fetch failed");
        })?;

        let mut report = IngestionReport::new(feed_url, started_at);
        let mut outcomes = stream::iter(items.enumerate())
            .map(|(index, item)| async move {
                let item = item?;
                Ok::<_, FetchError>(self.process(index + 1, item).await)
            })
            .buffered(self.concurrency);

        while let Some(outcome) = outcomes.next().await {
            let outcome = outcome.inspect_err(|e| {
                tracing::error!(feed_url = %feed_url, error = %e, "Feed parsing aborted");
            })?;
            report.record(outcome);
        }

        report.finished_at = Utc::now();
        tracing::info!(
            feed_url = %feed_url,
            created = report.created.len(),
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "Feed ingestion finished"
        );
        Ok(report)
    }

    async fn process(&self, position: usize, item: RawFeedItem) -> ItemOutcome {
        let guid = item.guid.clone();
        let result = match normalize(item) {
            Ok((guid, content)) => self
                .posts
                .upsert_by_guid(&guid, content)
                .await
                .map(|upserted| (guid, upserted.action))
                .map_err(ItemProcessingError::from),
            Err(e) => Err(e),
        };

        ItemOutcome {
            position,
            guid,
            result,
        }
    }
}

/// Turn a raw item into its upsert key and content.
pub fn normalize(item: RawFeedItem) -> Result<(String, PostContent), ItemProcessingError> {
    let guid = item
        .guid
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .ok_or(ItemProcessingError::MissingGuid)?;

    let pub_date = parse_timestamp(&item.pub_date)
        .ok_or_else(|| ItemProcessingError::InvalidPubDate(item.pub_date.clone()))?;

    Ok((
        guid,
        PostContent {
            title: item.title,
            link: item.link,
            description: item.description,
            pub_date,
        },
    ))
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(guid: Option<&str>, pub_date: &str) -> RawFeedItem {
        RawFeedItem {
            guid: guid.map(String::from),
            title: "Title".into(),
            link: "https://example.com/a".into(),
            description: String::new(),
            pub_date: pub_date.into(),
        }
    }

    #[test]
    fn test_normalize_valid_item() {
        let (guid, content) =
            normalize(raw(Some("  a1 "), "Wed, 19 Mar 2025 04:49:52 GMT")).unwrap();
        assert_eq!(guid, "a1");
        assert_eq!(content.title, "Title");
        assert_eq!(content.description, "");
        assert_eq!(content.pub_date.to_rfc3339(), "2025-03-19T04:49:52+00:00");
    }

    #[test]
    fn test_normalize_rejects_missing_guid() {
        let err = normalize(raw(None, "Wed, 19 Mar 2025 04:49:52 GMT")).unwrap_err();
        assert!(matches!(err, ItemProcessingError::MissingGuid));

        let err = normalize(raw(Some("   "), "Wed, 19 Mar 2025 04:49:52 GMT")).unwrap_err();
        assert!(matches!(err, ItemProcessingError::MissingGuid));
    }

    #[test]
    fn test_normalize_rejects_bad_pub_date() {
        let err = normalize(raw(Some("a1"), "not a date")).unwrap_err();
        assert!(matches!(err, ItemProcessingError::InvalidPubDate(d) if d == "not a date"));
    }

    #[test]
    fn test_report_summary() {
        let mut report = IngestionReport::new("https://feed", Utc::now());
        report.created.push("a1".into());
        report.unchanged.push("a2".into());
        report.failed.push(ItemFailure {
            position: 3,
            guid: None,
            error: ItemProcessingError::MissingGuid,
        });

        assert_eq!(report.processed(), 3);
        assert!(report.has_failures());
        assert_eq!(
            report.to_string(),
            "3 items from https://feed: 1 created, 0 updated, 1 unchanged, 1 failed"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"][0]["error"], "Item has no guid");
    }
}
