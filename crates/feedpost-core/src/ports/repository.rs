use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{NewPost, Page, Post, PostContent, Upserted, User};
use crate::error::RepoError;
use crate::query::PostQuery;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. A taken unique key is a `RepoError::Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
///
/// Implementations must make `upsert_by_guid` atomic per guid: two
/// concurrent upserts of the same guid never both insert.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Find a post by its surrogate ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Filtered, sorted page of posts plus the total match count.
    async fn get_posts(&self, query: &PostQuery) -> Result<Page<Post>, RepoError>;

    /// Insert a new post. A taken guid is a `RepoError::Constraint`.
    async fn create_post(&self, data: NewPost) -> Result<Post, RepoError>;

    /// Replace the mutable fields of `post`, refreshing it in place.
    ///
    /// Returns `false` without writing when `data` matches the stored row.
    async fn update_post(&self, post: &mut Post, data: NewPost) -> Result<bool, RepoError>;

    /// Remove `post`. Returns whether a row was deleted.
    async fn delete_post(&self, post: &Post) -> Result<bool, RepoError>;

    /// Insert-or-update keyed on `guid`.
    async fn upsert_by_guid(&self, guid: &str, content: PostContent)
    -> Result<Upserted, RepoError>;
}
