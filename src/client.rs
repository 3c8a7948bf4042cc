//! Blocking client for the geoflags backend.

use thiserror::Error;
use tracing::warn;

use crate::flags::{FeatureFlags, FlagRequest};
use crate::location::{LocationEstimate, ManualCatalog, ManualLocationOption};
use crate::server::HealthStatus;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Backend unreachable: {0}")]
    Network(String),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl From<ureq::Error> for ClientError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(t) => Self::Network(t.to_string()),
        }
    }
}

pub struct BackendClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("geoflags/", env!("CARGO_PKG_VERSION")))
                .build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.agent.get(&self.url("/health")).call()?;
        response
            .into_json()
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Fetch the manual catalog. Failures degrade to an empty list.
    pub fn manual_locations(&self) -> Vec<ManualLocationOption> {
        let result: Result<Vec<ManualLocationOption>, ClientError> = self
            .agent
            .get(&self.url("/manual-locations"))
            .call()
            .map_err(ClientError::from)
            .and_then(|r| r.into_json().map_err(|e| ClientError::InvalidResponse(e.to_string())));

        result.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch manual locations from backend");
            Vec::new()
        })
    }

    pub fn feature_flags(&self, location: &LocationEstimate) -> Result<FeatureFlags, ClientError> {
        let response = self
            .agent
            .post(&self.url("/feature-flags"))
            .send_json(location)?;
        response
            .into_json()
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

impl ManualCatalog for BackendClient {
    fn manual_locations(&self) -> Vec<ManualLocationOption> {
        BackendClient::manual_locations(self)
    }
}

/// One-line status banner for a health check; the error arm is shown to the
/// user but is not fatal.
pub fn health_banner(result: &Result<HealthStatus, ClientError>) -> String {
    match result {
        Ok(h) => format!("  \u{2705} {} {} is {}", h.service, h.version, h.status),
        Err(e) => format!("  \u{274C} Backend health check failed: {}", e),
    }
}

/// Evaluate locally, without a backend round trip.
pub fn evaluate_locally(location: &LocationEstimate) -> FeatureFlags {
    crate::flags::evaluate(&FlagRequest::from(location))
}
