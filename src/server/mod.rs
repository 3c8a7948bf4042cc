mod handlers;
mod state;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use crate::config::Config;

pub use handlers::HealthStatus;

/// Version reported by `/health`.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn build_router(config: &Config) -> Router {
    let state = Arc::new(AppState {
        service: config.service_name.clone(),
        version: SERVICE_VERSION.to_string(),
    });

    Router::new()
        .route("/", get(handlers::greeting))
        .route("/health", get(handlers::health))
        .route("/manual-locations", get(handlers::manual_locations))
        .route("/feature-flags", post(handlers::feature_flags))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(config: &Config) -> std::io::Result<()> {
    let app = build_router(config);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(%addr, "geoflags server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
