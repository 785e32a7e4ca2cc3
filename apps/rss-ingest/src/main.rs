//! One-shot feed ingestion.
//!
//! Fetches the feed once, upserts its items and prints the report as JSON on
//! stdout. Logs go to stderr. Exits non-zero when the feed itself cannot be
//! fetched or parsed; per-item failures are only reported.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use feedpost_core::ports::PostRepository;
use feedpost_core::services::IngestionPipeline;
use feedpost_infra::{DatabaseConfig, FeedConfig, HttpFeedSource, InMemoryPostRepository};

const DEFAULT_FILTER: &str = "info,rss_ingest=debug,feedpost_infra=debug";

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch an RSS feed once and upsert its items as posts")]
struct Args {
    /// Feed to ingest: an http(s) URL, a file:// URL or a local path
    #[arg(long, env = "RSS_FEED_URL")]
    url: String,

    /// Items upserted at once
    #[arg(long, env = "RSS_INGEST_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Fetch timeout in seconds
    #[arg(long, env = "RSS_FETCH_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log as JSON instead of human-readable lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn feed_config(&self) -> FeedConfig {
        let defaults = FeedConfig::default();
        FeedConfig {
            url: Some(self.url.clone()),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency).max(1),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json_logs);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Ingestion failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.feed_config();
    let posts = post_repository().await?;
    let source = HttpFeedSource::from_config(&config).context("building feed client")?;

    let pipeline =
        IngestionPipeline::new(posts, Arc::new(source)).with_concurrency(config.concurrency);
    let report = pipeline.ingest(&args.url).await?;

    tracing::info!(%report, "Ingestion complete");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(feature = "postgres")]
async fn post_repository() -> anyhow::Result<Arc<dyn PostRepository>> {
    use feedpost_infra::{DatabaseConnections, PostgresPostRepository};

    match DatabaseConfig::from_env() {
        Some(config) => {
            let conn = DatabaseConnections::init(&config)
                .await
                .context("connecting to DATABASE_URL")?;
            Ok(Arc::new(PostgresPostRepository::new(conn.main)))
        }
        None => Ok(in_memory()),
    }
}

#[cfg(not(feature = "postgres"))]
async fn post_repository() -> anyhow::Result<Arc<dyn PostRepository>> {
    if DatabaseConfig::from_env().is_some() {
        tracing::warn!("Built without postgres feature - DATABASE_URL ignored");
    }
    Ok(in_memory())
}

fn in_memory() -> Arc<dyn PostRepository> {
    tracing::warn!("DATABASE_URL not set - items are kept in memory and discarded on exit");
    Arc::new(InMemoryPostRepository::new())
}

fn init_tracing(json_logs: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
