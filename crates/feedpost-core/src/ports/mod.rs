//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod feed;
mod repository;

pub use auth::{AuthError, MIN_PASSWORD_LEN, PasswordService, TokenClaims, TokenService};
pub use cache::{Cache, CacheError};
pub use feed::{FeedItems, FeedSource, RawFeedItem};
pub use repository::{BaseRepository, PostRepository, UserRepository};
