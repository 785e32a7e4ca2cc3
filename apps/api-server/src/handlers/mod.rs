//! HTTP handlers and route configuration.

pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod posts;

use actix_web::{error, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        error::Error::from(AppError::BadRequest(err.to_string()))
    }))
    .service(api_scope());
}

fn api_scope() -> actix_web::Scope {
    let scope = web::scope("/api")
        // Public routes
        .route("/health", web::get().to(health::health_check))
        .route("/register", web::post().to(auth::register))
        .route("/login", web::post().to(auth::login))
        // Authenticated routes
        .route("/logout", web::post().to(auth::logout))
        .service(
            web::scope("/posts")
                .route("", web::get().to(posts::index))
                .route("", web::post().to(posts::store))
                .route("/{id}", web::get().to(posts::show))
                .route("/{id}", web::put().to(posts::update))
                .route("/{id}", web::delete().to(posts::destroy)),
        );

    #[cfg(feature = "openapi")]
    let scope = scope.route("/openapi.json", web::get().to(crate::openapi::openapi_json));

    scope
}

#[cfg(test)]
pub(crate) fn test_state() -> crate::state::AppState {
    crate::state::AppState::in_memory(feedpost_infra::auth::JwtConfig {
        secret: "handler-test-secret".to_string(),
        expiration_hours: 1,
        issuer: "feedpost-test".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};

    use super::*;

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "in-memory");
    }
}
