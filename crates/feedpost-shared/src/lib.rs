//! # Feedpost Shared
//!
//! Wire types of the HTTP API: request bodies, the post representation,
//! the paginated listing envelope and RFC 7807 error bodies.

pub mod dto;
pub mod response;

pub use dto::{PageMeta, PaginatedResponse, PostResponse};
pub use response::{ApiResponse, ErrorResponse};
