//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    pub timestamp: String,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses(
        (status = 200, description = "Status, version and database state")
    )
))]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = match &state.db {
        None => "in-memory",
        Some(db) => database_status(db).await,
    };

    let response = HealthResponse {
        status: if database == "down" { "degraded" } else { "ok" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(feature = "postgres")]
async fn database_status(db: &feedpost_infra::database::DatabaseConnections) -> &'static str {
    match db.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Database ping failed");
            "down"
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_status(_db: &feedpost_infra::database::DatabaseConnections) -> &'static str {
    "in-memory"
}
