//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use feedpost_core::domain::{Page, Post};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RegisterUserRequest {
    #[cfg_attr(feature = "openapi", schema(example = "reader@example.com"))]
    pub email: String,
    /// At least 8 characters.
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl AuthResponse {
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// A post as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PostResponse {
    pub id: i64,
    pub guid: Option<String>,
    pub title: String,
    #[cfg_attr(feature = "openapi", schema(example = "https://example.com/posts/1"))]
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            guid: post.guid,
            title: post.title,
            link: post.link,
            description: post.description,
            pub_date: post.pub_date,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Pagination details of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PageMeta {
    pub current_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
    /// Position of the first item on the page; `None` for an empty page.
    pub from: Option<u64>,
    pub to: Option<u64>,
}

/// Listing envelope: `{ "data": [...], "meta": {...} }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn from_page<U>(page: Page<U>) -> Self
    where
        T: From<U>,
    {
        let meta = PageMeta {
            current_page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page: page.last_page(),
            from: page.first_item(),
            to: page.last_item(),
        };

        Self {
            data: page.items.into_iter().map(T::from).collect(),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn post(id: i64) -> Post {
        let at = Utc.with_ymd_and_hms(2025, 3, 19, 4, 49, 52).unwrap();
        Post {
            id,
            guid: Some(format!("g{id}")),
            title: format!("Post {id}"),
            link: format!("https://example.com/{id}"),
            description: String::new(),
            pub_date: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_paginated_envelope() {
        let page = Page::new(vec![post(11), post(12)], 12, 2, 10);
        let response = PaginatedResponse::<PostResponse>::from_page(page);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"][0]["id"], 11);
        assert_eq!(json["data"][1]["guid"], "g12");
        assert_eq!(json["data"][0]["pub_date"], "2025-03-19T04:49:52Z");
        assert_eq!(
            json["meta"],
            serde_json::json!({
                "current_page": 2,
                "per_page": 10,
                "total": 12,
                "last_page": 2,
                "from": 11,
                "to": 12,
            })
        );
    }

    #[test]
    fn test_empty_page_meta() {
        let page: Page<Post> = Page::new(vec![], 12, 9, 10);
        let response = PaginatedResponse::<PostResponse>::from_page(page);

        assert!(response.data.is_empty());
        assert_eq!(response.meta.total, 12);
        assert_eq!(response.meta.from, None);
        assert_eq!(response.meta.to, None);
    }
}
