//! Filter, sort and pagination plan for listing posts.
//!
//! This module only resolves parameters into a [`PostQuery`]; repositories
//! decide how to execute it. [`PostQuery::matches`] and [`PostQuery::compare`]
//! evaluate the plan in memory and define the semantics storage backends
//! must reproduce.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::Post;

pub const DEFAULT_PER_PAGE: u64 = 10;
pub const DEFAULT_PAGE: u64 = 1;

/// Columns a listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    Title,
    Link,
    Description,
    PubDate,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Id,
        SortField::Title,
        SortField::Link,
        SortField::Description,
        SortField::PubDate,
        SortField::CreatedAt,
        SortField::UpdatedAt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Link => "link",
            SortField::Description => "description",
            SortField::PubDate => "pub_date",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == raw)
    }

    /// Unknown columns silently fall back to `id`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    fn compare(&self, a: &Post, b: &Post) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Link => a.link.cmp(&b.link),
            SortField::Description => a.description.cmp(&b.description),
            SortField::PubDate => a.pub_date.cmp(&b.pub_date),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Case-insensitive; anything but `desc` is ascending.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(order) if order.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Listing parameters after type coercion, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilters {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub per_page: Option<u64>,
    pub page: Option<u64>,
}

/// Resolved listing plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Non-blank search term, matched case-insensitively.
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: u64,
    pub per_page: u64,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self::from(PostFilters::default())
    }
}

impl From<PostFilters> for PostQuery {
    fn from(filters: PostFilters) -> Self {
        let search = filters
            .search
            .filter(|term| !term.trim().is_empty());

        Self {
            search,
            sort: SortField::parse_or_default(filters.sort_by.as_deref()),
            order: SortOrder::parse_or_default(filters.sort_order.as_deref()),
            page: filters.page.unwrap_or(DEFAULT_PAGE).max(1),
            per_page: filters.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
        }
    }
}

impl PostQuery {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    /// Search term lowercased, if any.
    pub fn search_term(&self) -> Option<String> {
        self.search.as_deref().map(str::to_lowercase)
    }

    /// Whether `post` satisfies the search predicate.
    pub fn matches(&self, post: &Post) -> bool {
        let Some(term) = self.search_term() else {
            return true;
        };

        [&post.title, &post.description, &post.link]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&term))
    }

    /// Total order: the requested column, then `id` ascending.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        self.order
            .apply(self.sort.compare(a, b))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Run the plan over an in-memory set of posts.
    pub fn apply<'a, I>(&self, posts: I) -> (Vec<Post>, u64)
    where
        I: IntoIterator<Item = &'a Post>,
    {
        let mut matching: Vec<&Post> = posts.into_iter().filter(|p| self.matches(p)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);

        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        (items, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(id: i64, title: &str, description: &str, link: &str) -> Post {
        let at = Utc.with_ymd_and_hms(2025, 3, 19, 0, 0, 0).unwrap();
        Post {
            id,
            guid: Some(format!("guid-{id}")),
            title: title.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            pub_date: at,
            created_at: at,
            updated_at: at,
        }
    }

    fn query(filters: PostFilters) -> PostQuery {
        PostQuery::from(filters)
    }

    #[test]
    fn test_defaults() {
        let q = PostQuery::default();
        assert_eq!(q.sort, SortField::Id);
        assert_eq!(q.order, SortOrder::Asc);
        assert_eq!(q.page, 1);
        assert_eq!(q.per_page, 10);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.search, None);
    }

    #[test]
    fn test_unknown_sort_field_falls_back_to_id() {
        let q = query(PostFilters {
            sort_by: Some("nonexistent_field".into()),
            ..Default::default()
        });
        let by_id = query(PostFilters {
            sort_by: Some("id".into()),
            ..Default::default()
        });
        assert_eq!(q, by_id);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::parse_or_default(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or_default(Some("sideways")), SortOrder::Asc);
        assert_eq!(SortOrder::parse_or_default(None), SortOrder::Asc);
    }

    #[test]
    fn test_offset_from_page() {
        let q = query(PostFilters {
            per_page: Some(5),
            page: Some(3),
            ..Default::default()
        });
        assert_eq!(q.offset(), 10);
        assert_eq!(q.limit(), 5);
    }

    #[test]
    fn test_blank_search_is_no_filter() {
        let q = query(PostFilters {
            search: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(q.search, None);
        assert!(q.matches(&post(1, "anything", "", "https://x")));
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let brew = post(1, "Morning Brew", "coffee", "https://x/brew");
        let other = post(2, "Evening", "tea", "https://x/tea");

        for term in ["brew", "COFFEE", "x/BREW"] {
            let q = query(PostFilters {
                search: Some(term.into()),
                ..Default::default()
            });
            assert!(q.matches(&brew), "{term} should match");
            assert!(!q.matches(&other), "{term} should not match");
        }
    }

    #[test]
    fn test_ties_break_on_id() {
        let posts = vec![
            post(3, "same", "", "https://a"),
            post(1, "same", "", "https://b"),
            post(2, "other", "", "https://c"),
        ];
        let q = query(PostFilters {
            sort_by: Some("title".into()),
            sort_order: Some("desc".into()),
            ..Default::default()
        });

        let (items, total) = q.apply(&posts);
        let ids: Vec<i64> = items.iter().map(|p| p.id).collect();
        assert_eq!(total, 3);
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_pages_concatenate_to_full_result() {
        let posts: Vec<Post> = (1..=7)
            .map(|id| post(id, &format!("t{}", id % 3), "", "https://x"))
            .collect();
        let full = query(PostFilters {
            sort_by: Some("title".into()),
            per_page: Some(100),
            ..Default::default()
        })
        .apply(&posts)
        .0;

        let mut concatenated = Vec::new();
        for page in 1..=3 {
            let (items, total) = query(PostFilters {
                sort_by: Some("title".into()),
                per_page: Some(3),
                page: Some(page),
                ..Default::default()
            })
            .apply(&posts);
            assert_eq!(total, 7);
            concatenated.extend(items);
        }

        assert_eq!(concatenated, full);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let posts = vec![post(1, "a", "", "https://x"), post(2, "b", "", "https://y")];
        let (items, total) = query(PostFilters {
            page: Some(1000),
            ..Default::default()
        })
        .apply(&posts);
        assert!(items.is_empty());
        assert_eq!(total, 2);
    }
}
