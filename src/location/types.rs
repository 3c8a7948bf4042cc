//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// How a location was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMethod {
    Browser,
    Ip,
    Manual,
    Default,
}

impl LocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Ip => "ip",
            Self::Manual => "manual",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for LocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A best-effort location produced by exactly one resolution step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEstimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub method: LocationMethod,
}

impl LocationEstimate {
    /// Coordinates from the device, with optional reverse-geocoded place names.
    pub fn from_device(coords: Coordinates, place: Option<Place>) -> Self {
        let (country, city) = match place {
            Some(p) => (p.country, p.city),
            None => (None, None),
        };
        Self {
            latitude: Some(coords.latitude),
            longitude: Some(coords.longitude),
            country,
            city,
            method: LocationMethod::Browser,
        }
    }

    pub fn from_ip(country: String, city: String) -> Self {
        Self {
            latitude: None,
            longitude: None,
            country: Some(country),
            city: Some(city),
            method: LocationMethod::Ip,
        }
    }

    /// A manual pick carries the option's country *code*, not its display name.
    pub fn from_manual(option: &ManualLocationOption) -> Self {
        Self {
            latitude: None,
            longitude: None,
            country: Some(option.country_code.clone()),
            city: Some(option.city.clone()),
            method: LocationMethod::Manual,
        }
    }

    pub fn from_default(country_code: &str) -> Self {
        Self {
            latitude: None,
            longitude: None,
            country: Some(country_code.to_string()),
            city: Some("Unknown".to_string()),
            method: LocationMethod::Default,
        }
    }

    pub fn summary(&self) -> String {
        let coords = match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => format!(" ({:.4}, {:.4})", lat, lon),
            _ => String::new(),
        };
        format!(
            "{}, {}{} [{}]",
            self.city.as_deref().unwrap_or("Unknown"),
            self.country.as_deref().unwrap_or("Unknown"),
            coords,
            self.method,
        )
    }
}

/// A static catalog entry offered for explicit user choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualLocationOption {
    pub city: String,
    pub country: String,
    pub country_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// A raw device fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Place names attached to a coordinate pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Constraints on a device position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Upper bound on how long acquiring a fix may take.
    pub timeout: Duration,
    /// Oldest cached fix that is still acceptable.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(5 * 60),
        }
    }
}

/// Location resolution errors. None of these reach the user; the resolver
/// logs them and moves on to the next step.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Device geolocation is not available")]
    Unavailable,
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Cached position is {age:?} old (allowed {max:?})")]
    Stale { age: Duration, max: Duration },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
    #[error("Response lacked a usable country and city")]
    Incomplete,
}
