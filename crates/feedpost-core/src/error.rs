//! Domain-level error types.

use thiserror::Error;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn post_not_found(id: i64) -> Self {
        Self::NotFound {
            entity_type: "Post",
            id: id.to_string(),
        }
    }
}

/// Repository-level errors.
#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

/// The feed could not be retrieved or is not a usable RSS document.
///
/// Aborts the whole ingestion run.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Failed to fetch feed: {0}")]
    Transport(String),

    #[error("Feed request returned HTTP {0}")]
    Status(u16),

    #[error("Feed is not well-formed XML: {0}")]
    Malformed(String),

    #[error("Feed has no channel element")]
    MissingChannel,
}

/// A single feed item could not be stored. Recorded, never fatal to the run.
#[derive(Debug, Clone, Error)]
pub enum ItemProcessingError {
    #[error("Item has no guid")]
    MissingGuid,

    #[error("Unparseable pubDate: {0:?}")]
    InvalidPubDate(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] RepoError),
}

/// Field-level validation failures of an API input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}
