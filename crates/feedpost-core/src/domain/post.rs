use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Post entity - an item ingested from a feed or created through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub guid: Option<String>,
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// The fields an upsert replaces.
    pub fn content(&self) -> PostContent {
        PostContent {
            title: self.title.clone(),
            link: self.link.clone(),
            description: self.description.clone(),
            pub_date: self.pub_date,
        }
    }

    /// Whether writing `data` would leave the row as it is.
    pub fn is_same_as(&self, data: &NewPost) -> bool {
        self.guid.as_deref() == Some(data.guid.as_str())
            && self.title == data.content.title
            && self.link == data.content.link
            && self.description == data.content.description
            && self.pub_date == data.content.pub_date
    }

    /// Overwrite the mutable fields, stamping `updated_at`.
    pub fn apply(&mut self, data: NewPost, updated_at: DateTime<Utc>) {
        self.guid = Some(data.guid);
        self.title = data.content.title;
        self.link = data.content.link;
        self.description = data.content.description;
        self.pub_date = data.content.pub_date;
        self.updated_at = updated_at;
    }
}

/// Feed-supplied fields of a post, replaced wholesale on every upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: DateTime<Utc>,
}

/// Payload for creating or updating a post through the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub guid: String,
    pub content: PostContent,
}

impl NewPost {
    pub fn new(guid: impl Into<String>, content: PostContent) -> Self {
        Self {
            guid: guid.into(),
            content,
        }
    }
}

/// What an upsert did to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
    /// The stored content already matched; `updated_at` was left alone.
    Unchanged,
}

/// Result of `PostRepository::upsert_by_guid`.
#[derive(Debug, Clone)]
pub struct Upserted {
    pub post: Post,
    pub action: UpsertAction,
}
