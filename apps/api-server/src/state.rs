//! Application state - shared across all handlers.

use std::sync::Arc;

use feedpost_core::ports::{Cache, PasswordService, PostRepository, TokenService, UserRepository};
use feedpost_infra::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
use feedpost_infra::cache::InMemoryCache;
use feedpost_infra::database::{DatabaseConnections, InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use feedpost_infra::database::{PostgresPostRepository, PostgresUserRepository};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    /// Token revocation list.
    pub cache: Arc<dyn Cache>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg_attr(not(feature = "postgres"), allow(unused_mut))]
        let mut state = Self::in_memory(config.jwt.clone());

        #[cfg(feature = "postgres")]
        match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let conn = Arc::new(connections);
                    state.users = Arc::new(PostgresUserRepository::new(conn.main.clone()));
                    state.posts = Arc::new(PostgresPostRepository::new(conn.main.clone()));
                    state.db = Some(conn);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            if config.database.is_some() {
                tracing::warn!("Built without postgres feature - DATABASE_URL ignored");
            }
            tracing::info!("Running without postgres feature - using in-memory repositories");
        }

        tracing::info!(database = state.db.is_some(), "Application state initialized");
        state
    }

    /// State backed entirely by in-memory implementations.
    pub fn in_memory(jwt: JwtConfig) -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            posts: Arc::new(InMemoryPostRepository::new()),
            cache: Arc::new(InMemoryCache::new()),
            tokens: Arc::new(JwtTokenService::new(jwt)),
            passwords: Arc::new(Argon2PasswordService::new()),
            db: None,
        }
    }
}
