//! Feed retrieval over HTTP(S), or from the local filesystem.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use feedpost_core::error::FetchError;
use feedpost_core::ports::{FeedItems, FeedSource};

use super::config::FeedConfig;
use super::parser::parse_feed;

/// Downloads the whole document, then parses it.
///
/// `http`/`https` URLs go through reqwest; `file://` URLs and bare paths are
/// read from disk.
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("feedpost/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self, FetchError> {
        Self::new(config.timeout)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Transport(format!("timed out fetching {url}"))
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn read_file(path: PathBuf) -> Result<Vec<u8>, FetchError> {
        tokio::fs::read(&path)
            .await
            .map_err(|e| FetchError::Transport(format!("{}: {e}", path.display())))
    }
}

enum Location {
    Remote,
    File(PathBuf),
}

fn locate(raw: &str) -> Result<Location, FetchError> {
    match Url::parse(raw) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(Location::Remote),
            "file" => url
                .to_file_path()
                .map(Location::File)
                .map_err(|_| FetchError::Transport(format!("invalid file URL: {raw}"))),
            other => Err(FetchError::Transport(format!(
                "unsupported URL scheme: {other}"
            ))),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Location::File(PathBuf::from(raw))),
        Err(e) => Err(FetchError::Transport(format!("invalid feed URL {raw}: {e}"))),
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedItems, FetchError> {
        tracing::debug!(feed_url = %url, "Fetching feed");

        let bytes = match locate(url)? {
            Location::Remote => self.download(url).await?,
            Location::File(path) => Self::read_file(path).await?,
        };

        tracing::debug!(feed_url = %url, bytes = bytes.len(), "Feed downloaded");
        parse_feed(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate() {
        assert!(matches!(locate("https://example.com/rss"), Ok(Location::Remote)));
        assert!(matches!(locate("http://example.com/rss"), Ok(Location::Remote)));
        assert!(matches!(
            locate("file:///tmp/feed.xml"),
            Ok(Location::File(p)) if p == PathBuf::from("/tmp/feed.xml")
        ));
        assert!(matches!(
            locate("fixtures/feed.xml"),
            Ok(Location::File(p)) if p == PathBuf::from("fixtures/feed.xml")
        ));
        assert!(matches!(locate("ftp://example.com/rss"), Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_fetch_from_file() {
        let path = std::env::temp_dir().join(format!("feedpost-{}.xml", uuid::Uuid::new_v4()));
        tokio::fs::write(
            &path,
            "<rss><channel><item><guid>f1</guid><title>From disk</title></item></channel></rss>",
        )
        .await
        .unwrap();

        let source = HttpFeedSource::new(Duration::from_secs(5)).unwrap();
        let items: Vec<_> = source
            .fetch(path.to_str().unwrap())
            .await
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "From disk");
    }

    #[tokio::test]
    async fn test_missing_file_is_transport_error() {
        let source = HttpFeedSource::new(Duration::from_secs(5)).unwrap();

        let err = source.fetch("/definitely/not/here.xml").await.err();
        assert!(matches!(err, Some(FetchError::Transport(_))));
    }
}
