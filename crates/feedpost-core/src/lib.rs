//! # Feedpost Core
//!
//! The domain layer: the `Post` entity, the listing query engine, request
//! inputs and their validation, the ports infrastructure implements, and the
//! feed ingestion pipeline built on top of them.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod input;
pub mod ports;
pub mod query;
pub mod services;

pub use error::{DomainError, FetchError, ItemProcessingError, RepoError, ValidationErrors};
