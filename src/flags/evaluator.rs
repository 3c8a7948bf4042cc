//! Location → feature flag rules.
//!
//! Each rule is evaluated independently. Absent or malformed inputs turn a
//! flag off; nothing here can fail.

use super::types::{FeatureFlags, FlagRequest};
use chrono::{DateTime, SecondsFormat, Utc};

const DARK_MODE_COUNTRIES: &[&str] = &["US", "UK", "CA", "IN", "INDIA"];

const PREMIUM_CITIES: &[&str] = &["New York", "London", "Tokyo", "Sydney", "Mumbai", "Delhi"];

/// Rough Silicon Valley bounding box, inclusive on all edges.
const BETA_LAT: (f64, f64) = (37.0, 38.0);
const BETA_LON: (f64, f64) = (-122.5, -121.5);

const UNKNOWN: &str = "Unknown";
const UNKNOWN_METHOD: &str = "unknown";

/// Evaluate flags at the current instant.
pub fn evaluate(req: &FlagRequest) -> FeatureFlags {
    evaluate_at(req, Utc::now())
}

/// Evaluate flags at a fixed instant.
pub fn evaluate_at(req: &FlagRequest, now: DateTime<Utc>) -> FeatureFlags {
    FeatureFlags {
        dark_mode: dark_mode(req.country.as_deref()),
        premium_features: premium_features(req.city.as_deref()),
        beta_features: beta_features(req.latitude, req.longitude),
        location: format_location(req.city.as_deref(), req.country.as_deref()),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        detection_method: req
            .method
            .clone()
            .unwrap_or_else(|| UNKNOWN_METHOD.to_string()),
    }
}

fn dark_mode(country: Option<&str>) -> bool {
    match country {
        Some(c) => {
            let upper = c.to_uppercase();
            DARK_MODE_COUNTRIES.contains(&upper.as_str())
        }
        None => false,
    }
}

fn premium_features(city: Option<&str>) -> bool {
    city.is_some_and(|c| PREMIUM_CITIES.contains(&c))
}

/// A coordinate of exactly zero counts as missing, so fixes on the equator
/// or prime meridian never qualify. The box does not contain zero anyway.
fn beta_features(latitude: Option<f64>, longitude: Option<f64>) -> bool {
    let (Some(lat), Some(lon)) = (latitude, longitude) else {
        return false;
    };
    if lat == 0.0 || lon == 0.0 {
        return false;
    }
    (BETA_LAT.0..=BETA_LAT.1).contains(&lat) && (BETA_LON.0..=BETA_LON.1).contains(&lon)
}

fn format_location(city: Option<&str>, country: Option<&str>) -> String {
    let city = city.filter(|s| !s.is_empty()).unwrap_or(UNKNOWN);
    let country = country.filter(|s| !s.is_empty()).unwrap_or(UNKNOWN);
    format!("{}, {}", city, country)
}
