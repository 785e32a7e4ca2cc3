use std::env;
use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};

/// Configuration for the posts database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 100,
            min_connections: 10,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Read `DATABASE_URL`, `DB_MAX_CONNECTIONS` and `DB_MIN_CONNECTIONS`.
    ///
    /// Returns `None` when no database URL is set.
    pub fn from_env() -> Option<Self> {
        let url = env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty())?;
        let mut config = Self::new(url);

        if let Some(max) = env::var("DB_MAX_CONNECTIONS").ok().and_then(|s| s.parse().ok()) {
            config.max_connections = max;
        }
        if let Some(min) = env::var("DB_MIN_CONNECTIONS").ok().and_then(|s| s.parse().ok()) {
            config.min_connections = min;
        }
        config.min_connections = config.min_connections.min(config.max_connections);

        Some(config)
    }
}

/// Pooled database connections.
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    pub main: DbConn,
}

#[cfg(not(feature = "postgres"))]
pub struct DatabaseConnections;

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open the connection pool.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connections...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!(
            "Database connected (pool: {}..{})",
            config.min_connections,
            config.max_connections
        );

        Ok(Self { main })
    }

    /// Round-trip a trivial statement, for health checks.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.execute_unprepared("SELECT 1").await.map(|_| ())
    }
}
