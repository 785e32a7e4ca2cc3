//! Application configuration loaded from environment variables.

use std::env;

use feedpost_infra::auth::JwtConfig;
use feedpost_infra::database::DatabaseConfig;
use feedpost_infra::feed::FeedConfig;

#[cfg(feature = "scheduler")]
use crate::background::SchedulerConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on in-memory repositories.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub feed: FeedConfig,
    #[cfg(feature = "scheduler")]
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            jwt: JwtConfig::from_env(),
            feed: FeedConfig::from_env(),
            #[cfg(feature = "scheduler")]
            scheduler: SchedulerConfig::from_env(),
        }
    }
}
