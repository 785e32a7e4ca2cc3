//! Per-operation request inputs and their validation.
//!
//! Each operation owns a raw input type carrying what the caller received
//! (strings straight from a query string or JSON body) and a `validate`
//! function turning it into the domain value the repository expects.

use serde::{Deserialize, Serialize};
use url::Url;
#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

use crate::domain::{NewPost, PostContent, parse_timestamp};
use crate::error::ValidationErrors;
use crate::query::PostFilters;

/// Largest page size a listing may request.
pub const MAX_PER_PAGE: u64 = 100;

/// Largest page number a listing may request. Keeps `offset` within a
/// Postgres `bigint` for every allowed page size.
pub const MAX_PAGE: u64 = i32::MAX as u64;

/// Input of the list operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListPostsInput {
    /// Case-insensitive substring of title, description or link.
    pub search: Option<String>,
    /// Column to sort by; unknown columns sort by `id`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`; anything else is `asc`.
    pub sort_order: Option<String>,
    /// Required, 1 to 100.
    pub per_page: Option<String>,
    /// 1-based, defaults to 1.
    pub page: Option<String>,
}

impl ListPostsInput {
    pub fn validate(self) -> Result<PostFilters, ValidationErrors> {
        let mut errors = Vec::new();

        let per_page = match self.per_page.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("The per_page field is required.".to_string());
                None
            }
            Some(raw) => positive_number("per_page", raw, &mut errors),
        };
        if per_page.is_some_and(|n| n > MAX_PER_PAGE) {
            errors.push(format!(
                "The per_page field must not be greater than {MAX_PER_PAGE}."
            ));
        }

        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => positive_number("page", raw, &mut errors),
        };
        if page.is_some_and(|n| n > MAX_PAGE) {
            errors.push(format!("The page field must not be greater than {MAX_PAGE}."));
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(PostFilters {
            search: self.search,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            per_page,
            page,
        })
    }
}

/// Input of the create operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePostInput {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
}

/// Updates replace every field and follow the same rules as creation.
pub type UpdatePostInput = CreatePostInput;

impl CreatePostInput {
    pub fn validate(self) -> Result<NewPost, ValidationErrors> {
        let mut errors = Vec::new();

        let guid = required("guid", self.guid, &mut errors);
        let title = required("title", self.title, &mut errors);
        let link = required("link", self.link, &mut errors);
        let description = required("description", self.description, &mut errors);
        let pub_date = required("pub_date", self.pub_date, &mut errors);

        if let Some(link) = &link {
            if !is_web_url(link) {
                errors.push("The link field must be a valid URL.".to_string());
            }
        }

        let pub_date = pub_date.and_then(|raw| {
            let parsed = parse_timestamp(&raw);
            if parsed.is_none() {
                errors.push("The pub_date field must be a valid date.".to_string());
            }
            parsed
        });

        match (guid, title, link, description, pub_date) {
            (Some(guid), Some(title), Some(link), Some(description), Some(pub_date))
                if errors.is_empty() =>
            {
                Ok(NewPost::new(
                    guid,
                    PostContent {
                        title,
                        link,
                        description,
                        pub_date,
                    },
                ))
            }
            _ => Err(ValidationErrors(errors)),
        }
    }
}

fn required(field: &str, value: Option<String>, errors: &mut Vec<String>) -> Option<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => {
            errors.push(format!("The {field} field is required."));
            None
        }
    }
}

/// Numeric strings are accepted (`"10"`, `"10.0"`); fractions are truncated.
fn positive_number(field: &str, raw: &str, errors: &mut Vec<String>) -> Option<u64> {
    let Ok(number) = raw.parse::<f64>() else {
        errors.push(format!("The {field} field must be a number."));
        return None;
    };
    if !number.is_finite() || number < 1.0 {
        errors.push(format!("The {field} field must be at least 1."));
        return None;
    }
    Some(number.trunc() as u64)
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}
