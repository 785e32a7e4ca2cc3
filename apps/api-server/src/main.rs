//! # Feedpost API Server
//!
//! The main entry point for the Actix-web HTTP server. Also schedules
//! periodic RSS ingestion when a feed is configured.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
#[cfg(feature = "openapi")]
mod openapi;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::{TelemetryConfig, init_telemetry};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        "Starting Feedpost API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await;

    #[cfg(feature = "scheduler")]
    let scheduler =
        background::start_feed_scheduler(&config.scheduler, &config.feed, &state).await;

    let result = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    if let Some(mut scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }

    tracing::info!("Server stopped");
    result
}
