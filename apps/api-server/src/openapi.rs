//! OpenAPI document of the HTTP API.

use actix_web::HttpResponse;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use feedpost_core::input::CreatePostInput;
use feedpost_shared::ErrorResponse;
use feedpost_shared::dto::{AuthResponse, LoginRequest, PageMeta, PostResponse, RegisterUserRequest};

use crate::handlers::{auth, health, posts};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Feedpost API",
        description = "Posts ingested from an RSS feed, with search, sorting and pagination"
    ),
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        posts::index,
        posts::store,
        posts::show,
        posts::update,
        posts::destroy
    ),
    components(schemas(
        PostResponse,
        PageMeta,
        CreatePostInput,
        RegisterUserRequest,
        LoginRequest,
        AuthResponse,
        ErrorResponse
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and access tokens"),
        (name = "posts", description = "Post CRUD"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the protected paths refer to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// GET /api/openapi.json
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::Value;

    use super::*;
    use crate::handlers::{configure_routes, test_state};

    #[::core::prelude::v1::test]
    fn test_document_covers_every_route() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/health",
            "/api/register",
            "/api/login",
            "/api/logout",
            "/api/posts",
            "/api/posts/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }

        let schemas = &doc.components.as_ref().unwrap().schemas;
        assert!(schemas.contains_key("PostResponse"));
        assert!(schemas.contains_key("ErrorResponse"));
    }

    #[actix_web::test]
    async fn test_document_is_served() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/openapi.json").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["info"]["title"], "Feedpost API");
        assert_eq!(
            body["components"]["securitySchemes"]["bearer_auth"]["scheme"],
            "bearer"
        );
        let list = &body["paths"]["/api/posts"]["get"];
        assert_eq!(list["security"][0]["bearer_auth"], Value::Array(vec![]));
        let params: Vec<&str> = list["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|p| p["name"].as_str())
            .collect();
        assert!(params.contains(&"per_page"), "{params:?}");
    }
}
