//! RSS feed retrieval and parsing.

mod config;
mod http;
mod memory;
mod parser;

pub use config::FeedConfig;
pub use http::HttpFeedSource;
pub use memory::InMemoryFeedSource;
pub use parser::parse_feed;
