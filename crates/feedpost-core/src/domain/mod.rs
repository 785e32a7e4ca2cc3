//! Domain entities - the core business objects.

mod page;
mod post;
mod timestamp;
mod user;

pub use page::Page;
pub use post::{NewPost, Post, PostContent, UpsertAction, Upserted};
pub use timestamp::parse_timestamp;
pub use user::{User, is_valid_email, normalize_email};
