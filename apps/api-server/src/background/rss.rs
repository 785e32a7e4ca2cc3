//! Scheduled feed ingestion.

use std::sync::Arc;

use feedpost_core::services::{IngestionPipeline, IngestionReport};
use feedpost_infra::feed::{FeedConfig, HttpFeedSource};

use super::scheduler::{Scheduler, SchedulerConfig};
use crate::state::AppState;

/// One ingestion run. A failed fetch is logged and leaves storage as it was.
pub async fn run_ingestion(pipeline: &IngestionPipeline, feed_url: &str) -> Option<IngestionReport> {
    match pipeline.ingest(feed_url).await {
        Ok(report) => {
            if report.has_failures() {
                tracing::warn!(feed_url = %feed_url, "{report}");
            } else {
                tracing::info!(feed_url = %feed_url, "{report}");
            }
            Some(report)
        }
        Err(e) => {
            tracing::error!(feed_url = %feed_url, error = %e, "Scheduled ingestion failed");
            None
        }
    }
}

/// Start the scheduler with the feed job, if a feed is configured.
///
/// The returned scheduler must be kept alive for jobs to keep running.
pub async fn start_feed_scheduler(
    config: &SchedulerConfig,
    feed: &FeedConfig,
    state: &AppState,
) -> Option<Scheduler> {
    let Some(feed_url) = feed.url.clone() else {
        tracing::info!("RSS_FEED_URL not set, scheduled ingestion disabled");
        return None;
    };
    if !config.enabled {
        tracing::info!("Scheduler disabled");
        return None;
    }

    let source = match HttpFeedSource::from_config(feed) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            tracing::error!(error = %e, "Could not build feed client");
            return None;
        }
    };
    let pipeline = Arc::new(
        IngestionPipeline::new(state.posts.clone(), source).with_concurrency(feed.concurrency),
    );

    let scheduler = match Scheduler::new(config.clone()).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!(error = %e, "Could not create scheduler");
            return None;
        }
    };

    let registered = scheduler
        .add_cron(&config.feed_schedule, move || {
            let pipeline = pipeline.clone();
            let feed_url = feed_url.clone();
            async move {
                run_ingestion(&pipeline, &feed_url).await;
            }
        })
        .await;

    if let Err(e) = registered {
        tracing::error!(
            schedule = %config.feed_schedule,
            error = %e,
            "Invalid RSS_FETCH_SCHEDULE, scheduled ingestion disabled"
        );
        return None;
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!(error = %e, "Scheduler failed to start");
        return None;
    }

    Some(scheduler)
}
