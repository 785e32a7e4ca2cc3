//! # Feedpost Infrastructure
//!
//! Concrete implementations of the ports defined in `feedpost-core`:
//! post and user storage, the token revocation cache, authentication, and
//! RSS feed retrieval.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `feed` - RSS fetching (reqwest) and parsing (quick-xml)

pub mod cache;
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "feed")]
pub mod feed;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, DatabaseConnections, InMemoryPostRepository, InMemoryUserRepository};

#[cfg(feature = "postgres")]
pub use database::{PostgresPostRepository, PostgresUserRepository};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "feed")]
pub use feed::{FeedConfig, HttpFeedSource, InMemoryFeedSource};
