//! Authentication handlers.

use actix_web::{HttpResponse, web};

use feedpost_core::domain::{User, is_valid_email, normalize_email};
use feedpost_core::error::RepoError;
use feedpost_core::ports::AuthError;
use feedpost_shared::ApiResponse;
#[cfg(feature = "openapi")]
use feedpost_shared::ErrorResponse;
use feedpost_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use crate::middleware::auth::{Identity, revoked_token_key};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.email, vec!["user".to_string()])?;
    let expires_in = u64::try_from(state.tokens.expiration_seconds()).unwrap_or(0);

    Ok(AuthResponse::bearer(token, expires_in))
}

/// Collect every registration problem so the client sees them at once.
fn validate_registration(state: &AppState, req: &RegisterUserRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    if !is_valid_email(&req.email) {
        errors.push("The email field must be a valid email address.".to_string());
    }
    match state.passwords.check_strength(&req.password) {
        Ok(()) => {}
        Err(AuthError::WeakPassword(msg)) => errors.push(msg),
        Err(other) => return Err(other.into()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("Email already registered".to_string())
}

/// POST /api/register
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Account created; carries a token", body = AuthResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid email or weak password", body = ErrorResponse)
    )
))]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_registration(&state, &req)?;

    if state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .is_some()
    {
        return Err(email_taken());
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .insert(User::new(&req.email, password_hash))
        .await
        .map_err(|e| match e {
            RepoError::Constraint(_) => email_taken(),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /api/login
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access token", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    )
))]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&normalize_email(&req.email))
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// POST /api/logout - revokes the presented token until it expires.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Missing, invalid or revoked token", body = ErrorResponse)
    )
))]
pub async fn logout(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state
        .cache
        .insert(
            &revoked_token_key(identity.token_id),
            identity.remaining_lifetime(),
        )
        .await?;

    tracing::info!(user_id = %identity.user_id, "User logged out");
    Ok(HttpResponse::Ok().json(ApiResponse::message("Successfully logged out")))
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use serde_json::json;

    use super::*;
    use crate::handlers::{configure_routes, test_state};

    #[actix_web::test]
    async fn test_register_login_logout() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await;

        let credentials = json!({ "email": "Reader@Example.com", "password": "correct horse" });

        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(&credentials)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(&credentials)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({ "email": " READER@example.com", "password": "correct horse" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(body.token_type, "Bearer");
        let bearer = format!("Bearer {}", body.access_token);

        let req = test::TestRequest::get()
            .uri("/api/posts?per_page=10")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/posts?per_page=10")
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["detail"], "This token has been revoked.");
    }

    #[actix_web::test]
    async fn test_login_with_wrong_password() {
        let state = test_state();
        let hash = state.passwords.hash("right-password").unwrap();
        state
            .users
            .insert(User::new("someone@example.com", hash))
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        for (email, password) in [
            ("someone@example.com", "wrong-password"),
            ("nobody@example.com", "right-password"),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/login")
                .set_json(json!({ "email": email, "password": password }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn test_register_validation() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(json!({ "email": "not-an-email", "password": "short" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["errors"],
            json!([
                "The email field must be a valid email address.",
                "The password field must be at least 8 characters."
            ])
        );
    }

    #[actix_web::test]
    async fn test_logout_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/logout").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
