//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, OnConflict, Order, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Select,
};

use feedpost_core::domain::{
    NewPost, Page, Post, PostContent, UpsertAction, Upserted, User, normalize_email,
};
use feedpost_core::error::RepoError;
use feedpost_core::ports::{PostRepository, UserRepository};
use feedpost_core::query::{PostQuery, SortField, SortOrder};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, repo_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Only advance `updated_at` when the incoming row differs from the stored one.
pub(crate) const UPDATED_AT_ON_CHANGE: &str = r#"CASE WHEN ("posts"."title", "posts"."link", "posts"."description", "posts"."pub_date") IS DISTINCT FROM (EXCLUDED."title", EXCLUDED."link", EXCLUDED."description", EXCLUDED."pub_date") THEN EXCLUDED."updated_at" ELSE "posts"."updated_at" END"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.map(Into::into))
    }

    async fn get_posts(&self, query: &PostQuery) -> Result<Page<Post>, RepoError> {
        let paginator = listing_select(query).paginate(&self.db, query.per_page);

        let total = paginator.num_items().await.map_err(repo_error)?;

        // Pages past the end are empty without another round trip.
        let offset = query
            .page
            .checked_sub(1)
            .and_then(|index| index.checked_mul(query.per_page));
        let models = match offset {
            Some(offset) if offset < total => paginator
                .fetch_page(query.page - 1)
                .await
                .map_err(repo_error)?,
            _ => Vec::new(),
        };

        tracing::debug!(
            total,
            page = query.page,
            per_page = query.per_page,
            sort = query.sort.as_str(),
            "Listed posts"
        );

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            total,
            query.page,
            query.per_page,
        ))
    }

    async fn create_post(&self, data: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel::for_insert(data, db_now().into())
            .insert(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(model.into())
    }

    async fn update_post(&self, post: &mut Post, data: NewPost) -> Result<bool, RepoError> {
        if post.is_same_as(&data) {
            return Ok(false);
        }

        let active = post::ActiveModel {
            id: ActiveValue::Unchanged(post.id),
            guid: ActiveValue::Set(Some(data.guid)),
            title: ActiveValue::Set(data.content.title),
            link: ActiveValue::Set(data.content.link),
            description: ActiveValue::Set(data.content.description),
            pub_date: ActiveValue::Set(data.content.pub_date.into()),
            created_at: ActiveValue::NotSet,
            updated_at: ActiveValue::Set(db_now().into()),
        };

        let model = active.update(&self.db).await.map_err(repo_error)?;
        *post = model.into();
        Ok(true)
    }

    async fn delete_post(&self, post: &Post) -> Result<bool, RepoError> {
        let result = PostEntity::delete_by_id(post.id)
            .exec(&self.db)
            .await
            .map_err(repo_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn upsert_by_guid(
        &self,
        guid: &str,
        content: PostContent,
    ) -> Result<Upserted, RepoError> {
        let now = db_now();
        let row = post::ActiveModel::for_insert(NewPost::new(guid, content), now.into());

        let on_conflict = OnConflict::column(post::Column::Guid)
            .update_columns([
                post::Column::Title,
                post::Column::Link,
                post::Column::Description,
                post::Column::PubDate,
            ])
            .value(post::Column::UpdatedAt, Expr::cust(UPDATED_AT_ON_CHANGE))
            .to_owned();

        let model = PostEntity::insert(row)
            .on_conflict(on_conflict)
            .exec_with_returning(&self.db)
            .await
            .map_err(repo_error)?;

        let action = classify_upsert(&model, now);
        tracing::debug!(guid = %guid, id = model.id, ?action, "Upserted post");

        Ok(Upserted {
            post: model.into(),
            action,
        })
    }
}

/// Current time at the precision Postgres stores, so returned rows compare equal.
fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Tell what an upsert did from the row it returned.
///
/// Only an insert stamps `created_at` with this statement's `now`; only a
/// changing update stamps `updated_at` with it.
pub(crate) fn classify_upsert(model: &post::Model, now: DateTime<Utc>) -> UpsertAction {
    let created_at: DateTime<Utc> = model.created_at.into();
    let updated_at: DateTime<Utc> = model.updated_at.into();

    if created_at == now {
        UpsertAction::Created
    } else if updated_at == now {
        UpsertAction::Updated
    } else {
        UpsertAction::Unchanged
    }
}

/// Filtered and ordered select for a listing; pagination is left to the caller.
pub(crate) fn listing_select(query: &PostQuery) -> Select<PostEntity> {
    let mut select = PostEntity::find();

    if let Some(term) = query.search_term() {
        let pattern = format!("%{}%", escape_like(&term));
        select = select.filter(
            Condition::any()
                .add(lower_like(post::Column::Title, &pattern))
                .add(lower_like(post::Column::Description, &pattern))
                .add(lower_like(post::Column::Link, &pattern)),
        );
    }

    let order = match query.order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    select = select.order_by(sort_column(query.sort), order);

    if query.sort != SortField::Id {
        select = select.order_by(post::Column::Id, Order::Asc);
    }

    select
}

fn sort_column(field: SortField) -> post::Column {
    match field {
        SortField::Id => post::Column::Id,
        SortField::Title => post::Column::Title,
        SortField::Link => post::Column::Link,
        SortField::Description => post::Column::Description,
        SortField::PubDate => post::Column::PubDate,
        SortField::CreatedAt => post::Column::CreatedAt,
        SortField::UpdatedAt => post::Column::UpdatedAt,
    }
}

fn lower_like(column: post::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((PostEntity, column))))
        .like(LikeExpr::new(pattern).escape('\\'))
}

/// Escape LIKE wildcards so the term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().filter(|_| local.chars().count() > 1);
            match first {
                Some(c) => format!("{c}***@{domain}"),
                None => format!("***@{domain}"),
            }
        }
        None => "***".to_string(),
    }
}
