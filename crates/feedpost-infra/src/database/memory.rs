//! In-memory repositories - used when no database is configured, and in tests.
//!
//! Note: Data is lost on process restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use feedpost_core::domain::{
    NewPost, Page, Post, PostContent, UpsertAction, Upserted, User, normalize_email,
};
use feedpost_core::error::RepoError;
use feedpost_core::ports::{BaseRepository, PostRepository, UserRepository};
use feedpost_core::query::PostQuery;

#[derive(Default)]
struct PostTable {
    rows: BTreeMap<i64, Post>,
    by_guid: HashMap<String, i64>,
    last_id: i64,
}

impl PostTable {
    fn guid_owner(&self, guid: &str) -> Option<i64> {
        self.by_guid.get(guid).copied()
    }

    fn insert(&mut self, guid: String, content: PostContent) -> Post {
        self.last_id += 1;
        let now = stamp(None);
        let post = Post {
            id: self.last_id,
            guid: Some(guid.clone()),
            title: content.title,
            link: content.link,
            description: content.description,
            pub_date: content.pub_date,
            created_at: now,
            updated_at: now,
        };

        self.by_guid.insert(guid, post.id);
        self.rows.insert(post.id, post.clone());
        post
    }
}

/// Timestamp for a write, strictly after the row's previous one.
fn stamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(prev) if prev >= now => prev + TimeDelta::microseconds(1),
        _ => now,
    }
}

/// In-memory post repository.
///
/// Every write holds the table's write lock for its whole duration, which
/// makes `upsert_by_guid` atomic per guid.
#[derive(Default)]
pub struct InMemoryPostRepository {
    table: RwLock<PostTable>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn get_posts(&self, query: &PostQuery) -> Result<Page<Post>, RepoError> {
        let table = self.table.read().await;
        let (items, total) = query.apply(table.rows.values());

        Ok(Page::new(items, total, query.page, query.per_page))
    }

    async fn create_post(&self, data: NewPost) -> Result<Post, RepoError> {
        let mut table = self.table.write().await;

        if table.guid_owner(&data.guid).is_some() {
            return Err(RepoError::Constraint(format!(
                "guid {} already exists",
                data.guid
            )));
        }

        Ok(table.insert(data.guid, data.content))
    }

    async fn update_post(&self, post: &mut Post, data: NewPost) -> Result<bool, RepoError> {
        let mut table = self.table.write().await;

        if table.guid_owner(&data.guid).is_some_and(|owner| owner != post.id) {
            return Err(RepoError::Constraint(format!(
                "guid {} already exists",
                data.guid
            )));
        }

        let Some(stored) = table.rows.get(&post.id).cloned() else {
            return Err(RepoError::NotFound);
        };

        if stored.is_same_as(&data) {
            *post = stored;
            return Ok(false);
        }

        if let Some(old_guid) = &stored.guid {
            table.by_guid.remove(old_guid);
        }
        table.by_guid.insert(data.guid.clone(), post.id);

        let mut updated = stored;
        let updated_at = stamp(Some(updated.updated_at));
        updated.apply(data, updated_at);
        table.rows.insert(updated.id, updated.clone());

        *post = updated;
        Ok(true)
    }

    async fn delete_post(&self, post: &Post) -> Result<bool, RepoError> {
        let mut table = self.table.write().await;

        let Some(removed) = table.rows.remove(&post.id) else {
            return Ok(false);
        };
        if let Some(guid) = &removed.guid {
            table.by_guid.remove(guid);
        }
        Ok(true)
    }

    async fn upsert_by_guid(
        &self,
        guid: &str,
        content: PostContent,
    ) -> Result<Upserted, RepoError> {
        let mut table = self.table.write().await;

        let Some(id) = table.guid_owner(guid) else {
            let post = table.insert(guid.to_string(), content);
            return Ok(Upserted {
                post,
                action: UpsertAction::Created,
            });
        };

        let row = table.rows.get_mut(&id).ok_or(RepoError::NotFound)?;
        if row.content() == content {
            return Ok(Upserted {
                post: row.clone(),
                action: UpsertAction::Unchanged,
            });
        }

        row.updated_at = stamp(Some(row.updated_at));
        row.title = content.title;
        row.link = content.link;
        row.description = content.description;
        row.pub_date = content.pub_date;

        Ok(Upserted {
            post: row.clone(),
            action: UpsertAction::Updated,
        })
    }
}

/// In-memory user repository.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(RepoError::Constraint("email already registered".to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use feedpost_core::query::PostFilters;

    use super::*;

    fn content(title: &str, description: &str, link: &str) -> PostContent {
        PostContent {
            title: title.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            pub_date: Utc.with_ymd_and_hms(2025, 3, 19, 4, 49, 52).unwrap(),
        }
    }

    fn listing(filters: PostFilters) -> PostQuery {
        PostQuery::from(filters)
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let repo = InMemoryPostRepository::new();
        let data = content("Morning Brew", "coffee", "https://x/brew");

        let first = repo.upsert_by_guid("a1", data.clone()).await.unwrap();
        let second = repo.upsert_by_guid("a1", data.clone()).await.unwrap();

        assert_eq!(first.action, UpsertAction::Created);
        assert_eq!(second.action, UpsertAction::Unchanged);
        assert_eq!(first.post.id, second.post.id);
        assert_eq!(second.post.content(), data);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_content() {
        let repo = InMemoryPostRepository::new();

        let first = repo
            .upsert_by_guid("a1", content("Old", "old", "https://x/old"))
            .await
            .unwrap();
        let second = repo
            .upsert_by_guid("a1", content("New", "", "https://x/new"))
            .await
            .unwrap();

        assert_eq!(second.action, UpsertAction::Updated);
        assert_eq!(second.post.id, first.post.id);
        assert_eq!(second.post.title, "New");
        assert_eq!(second.post.description, "");
        assert_eq!(second.post.created_at, first.post.created_at);
        assert!(second.post.updated_at > first.post.updated_at);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_insert_once() {
        let repo = Arc::new(InMemoryPostRepository::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.upsert_by_guid("same", content("t", "d", "https://x"))
                        .await
                        .unwrap()
                        .action
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() == UpsertAction::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_with_taken_guid_fails() {
        let repo = InMemoryPostRepository::new();
        let original = repo
            .create_post(NewPost::new("a1", content("First", "", "https://x/1")))
            .await
            .unwrap();

        let err = repo
            .create_post(NewPost::new("a1", content("Second", "", "https://x/2")))
            .await
            .unwrap_err();

        assert!(matches!(err, RepoError::Constraint(_)));
        let stored = repo.find_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored, original);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_post() {
        let repo = InMemoryPostRepository::new();
        let mut post = repo
            .create_post(NewPost::new("a1", content("First", "", "https://x/1")))
            .await
            .unwrap();
        let id = post.id;

        let unchanged = repo
            .update_post(&mut post, NewPost::new("a1", content("First", "", "https://x/1")))
            .await
            .unwrap();
        assert!(!unchanged);

        let changed = repo
            .update_post(&mut post, NewPost::new("b2", content("Renamed", "", "https://x/1")))
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(post.id, id);
        assert_eq!(post.title, "Renamed");
        assert_eq!(post.guid.as_deref(), Some("b2"));

        // the old guid is free again
        repo.create_post(NewPost::new("a1", content("Again", "", "https://x/2")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_to_foreign_guid_fails() {
        let repo = InMemoryPostRepository::new();
        repo.create_post(NewPost::new("a1", content("A", "", "https://x/a")))
            .await
            .unwrap();
        let mut b = repo
            .create_post(NewPost::new("b2", content("B", "", "https://x/b")))
            .await
            .unwrap();

        let err = repo
            .update_post(&mut b, NewPost::new("a1", content("B", "", "https://x/b")))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_deleted_post_is_not_found() {
        let repo = InMemoryPostRepository::new();
        let mut post = repo
            .create_post(NewPost::new("a1", content("A", "", "https://x/a")))
            .await
            .unwrap();

        assert!(repo.delete_post(&post).await.unwrap());
        assert!(!repo.delete_post(&post).await.unwrap());

        let err = repo
            .update_post(&mut post, NewPost::new("a1", content("B", "", "https://x/a")))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound));
    }

    #[tokio::test]
    async fn test_listing_search_and_empty_page() {
        let repo = InMemoryPostRepository::new();
        repo.upsert_by_guid("a1", content("Morning Brew", "coffee", "https://x/brew"))
            .await
            .unwrap();
        repo.upsert_by_guid("a2", content("Evening", "tea", "https://x/tea"))
            .await
            .unwrap();

        let page = repo
            .get_posts(&listing(PostFilters {
                search: Some("COFFEE".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title, "Morning Brew");

        let page = repo
            .get_posts(&listing(PostFilters {
                page: Some(1000),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1000);
    }

    #[tokio::test]
    async fn test_listing_sort_fallback_matches_id() {
        let repo = InMemoryPostRepository::new();
        for (guid, title) in [("c", "Charlie"), ("a", "Alpha"), ("b", "Bravo")] {
            repo.upsert_by_guid(guid, content(title, "", "https://x"))
                .await
                .unwrap();
        }

        let by_bogus = repo
            .get_posts(&listing(PostFilters {
                sort_by: Some("nonexistent_field".into()),
                ..Default::default()
            }))
            .await
            .unwrap();
        let by_id = repo
            .get_posts(&listing(PostFilters {
                sort_by: Some("id".into()),
                ..Default::default()
            }))
            .await
            .unwrap();

        assert_eq!(by_bogus, by_id);
        let titles: Vec<_> = by_id.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Charlie", "Alpha", "Bravo"]);
    }

    #[tokio::test]
    async fn test_users_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = repo.insert(User::new("a@example.com", "hash")).await.unwrap();

        let found = repo.find_by_email(" A@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);

        let err = repo
            .insert(User::new("A@EXAMPLE.COM", "other"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }
}
