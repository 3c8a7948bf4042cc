use axum::body::Bytes;
use axum::extract::State;
use axum::response::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::flags::{self, FeatureFlags, FlagRequest};
use crate::location::{manual_location_options, ManualLocationOption};

use super::state::AppState;

// ─── GET / ───────────────────────────────────────────────────────

pub async fn greeting() -> &'static str {
    "Hello World!"
}

// ─── GET /health ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".into(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        service: state.service.clone(),
        version: state.version.clone(),
    })
}

// ─── GET /manual-locations ───────────────────────────────────────

pub async fn manual_locations() -> Json<Vec<ManualLocationOption>> {
    Json(manual_location_options())
}

// ─── POST /feature-flags ─────────────────────────────────────────

/// Takes the raw body so that malformed JSON degrades to an empty request
/// instead of a 4xx.
pub async fn feature_flags(body: Bytes) -> Json<FeatureFlags> {
    let start = Instant::now();

    let req = FlagRequest::from_body(&body);
    let result = flags::evaluate(&req);

    info!(
        location = %result.location,
        method = %result.detection_method,
        dark_mode = result.dark_mode,
        premium = result.premium_features,
        beta = result.beta_features,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "POST /feature-flags"
    );

    Json(result)
}
