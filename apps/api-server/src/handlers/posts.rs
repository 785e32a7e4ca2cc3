//! Post CRUD handlers. All of them require authentication.

use actix_web::{HttpResponse, web};

use feedpost_core::DomainError;
use feedpost_core::domain::Post;
use feedpost_core::error::RepoError;
use feedpost_core::input::{CreatePostInput, ListPostsInput, UpdatePostInput};
use feedpost_core::query::PostQuery;
#[cfg(feature = "openapi")]
use feedpost_shared::ErrorResponse;
use feedpost_shared::{PaginatedResponse, PostResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn guid_conflict(err: RepoError) -> AppError {
    match err {
        RepoError::Constraint(_) => AppError::Conflict("The guid has already been taken.".to_string()),
        other => other.into(),
    }
}

async fn find_post(state: &AppState, id: i64) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::post_not_found(id).into())
}

/// GET /api/posts
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(ListPostsInput),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Filtered, sorted page of posts", body = PaginatedResponse<PostResponse>),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse),
        (status = 422, description = "Invalid listing parameters", body = ErrorResponse)
    )
))]
pub async fn index(
    state: web::Data<AppState>,
    _identity: Identity,
    params: web::Query<ListPostsInput>,
) -> AppResult<HttpResponse> {
    let query = PostQuery::from(params.into_inner().validate()?);
    let page = state.posts.get_posts(&query).await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse::<PostResponse>::from_page(page)))
}

/// POST /api/posts
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse),
        (status = 409, description = "The guid is already taken", body = ErrorResponse),
        (status = 422, description = "Invalid post fields", body = ErrorResponse)
    )
))]
pub async fn store(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostInput>,
) -> AppResult<HttpResponse> {
    let data = body.into_inner().validate()?;
    let post = state.posts.create_post(data).await.map_err(guid_conflict)?;

    tracing::info!(post_id = post.id, user_id = %identity.user_id, "Post created");
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// GET /api/posts/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The post", body = PostResponse),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse),
        (status = 404, description = "No post with this id", body = ErrorResponse)
    )
))]
pub async fn show(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// PUT /api/posts/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    request_body = CreatePostInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The updated post", body = PostResponse),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse),
        (status = 404, description = "No post with this id", body = ErrorResponse),
        (status = 409, description = "The guid belongs to another post", body = ErrorResponse),
        (status = 422, description = "Invalid post fields", body = ErrorResponse)
    )
))]
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<UpdatePostInput>,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, path.into_inner()).await?;
    let data = body.into_inner().validate()?;

    let changed = state
        .posts
        .update_post(&mut post, data)
        .await
        .map_err(guid_conflict)?;

    tracing::info!(post_id = post.id, user_id = %identity.user_id, changed, "Post updated");
    Ok(HttpResponse::Ok().json(PostResponse::from(post)))
}

/// DELETE /api/posts/{id}
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(("id" = i64, Path, description = "Post id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse),
        (status = 404, description = "No post with this id", body = ErrorResponse)
    )
))]
pub async fn destroy(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let post = find_post(&state, id).await?;

    if !state.posts.delete_post(&post).await? {
        return Err(DomainError::post_not_found(id).into());
    }

    tracing::info!(post_id = id, user_id = %identity.user_id, "Post deleted");
    Ok(HttpResponse::NoContent().finish())
}
