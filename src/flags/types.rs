//! Wire types for flag evaluation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flags derived from a single location estimate. Computed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub dark_mode: bool,
    pub premium_features: bool,
    pub beta_features: bool,
    pub location: String,
    pub timestamp: String,
    pub detection_method: String,
}

/// The server's view of a `POST /feature-flags` body.
///
/// Every field is optional and a value of the wrong JSON type is treated as
/// absent, so no body is ever rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Accepted for compatibility; not used by any rule.
    pub ip: Option<String>,
    pub method: Option<String>,
}

impl FlagRequest {
    /// Parse a raw body field by field. A body that is not a JSON object
    /// yields an empty request; a repeated key keeps its last value.
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Self::from_object(&map),
            _ => Self::default(),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let number = |key: &str| map.get(key).and_then(Value::as_f64);
        let string = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            latitude: number("latitude"),
            longitude: number("longitude"),
            country: string("country"),
            city: string("city"),
            ip: string("ip"),
            method: string("method"),
        }
    }
}

impl From<&crate::location::LocationEstimate> for FlagRequest {
    fn from(est: &crate::location::LocationEstimate) -> Self {
        Self {
            latitude: est.latitude,
            longitude: est.longitude,
            country: est.country.clone(),
            city: est.city.clone(),
            ip: None,
            method: Some(est.method.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{LocationEstimate, LocationMethod};

    #[test]
    fn test_flags_serialize_camel_case() {
        let flags = FeatureFlags {
            dark_mode: true,
            premium_features: false,
            beta_features: false,
            location: "London, UK".into(),
            timestamp: "2025-01-01T00:00:00.000Z".into(),
            detection_method: "ip".into(),
        };
        let v = serde_json::to_value(&flags).unwrap();
        assert_eq!(v["darkMode"], true);
        assert_eq!(v["premiumFeatures"], false);
        assert_eq!(v["detectionMethod"], "ip");
    }

    #[test]
    fn test_request_wrong_types_become_absent() {
        let req = FlagRequest::from_body(
            br#"{"latitude":"37.5","longitude":null,"country":44,"city":["x"],"method":true}"#,
        );
        assert_eq!(req, FlagRequest::default());
    }

    #[test]
    fn test_request_non_object_body() {
        assert_eq!(FlagRequest::from_body(b"not json"), FlagRequest::default());
        assert_eq!(FlagRequest::from_body(b"42"), FlagRequest::default());
        assert_eq!(FlagRequest::from_body(br#""US""#), FlagRequest::default());
        assert_eq!(FlagRequest::from_body(b""), FlagRequest::default());
    }

    #[test]
    fn test_request_accepts_ip_and_integers() {
        let req = FlagRequest::from_body(br#"{"latitude":37,"longitude":-122,"ip":"8.8.8.8"}"#);
        assert_eq!(req.latitude, Some(37.0));
        assert_eq!(req.longitude, Some(-122.0));
        assert_eq!(req.ip.as_deref(), Some("8.8.8.8"));
    }

    #[test]
    fn test_request_from_estimate() {
        let est = LocationEstimate::from_default("FR");
        let req = FlagRequest::from(&est);
        assert_eq!(req.method.as_deref(), Some(LocationMethod::Default.as_str()));
        assert_eq!(req.city.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_array_body_has_no_fields() {
        let req = FlagRequest::from_body(br#"[37.5,-122.0,"US","New York",null,"ip"]"#);
        assert_eq!(req, FlagRequest::default());
    }

    #[test]
    fn test_duplicate_key_keeps_last_value() {
        let req = FlagRequest::from_body(br#"{"country":"US","city":"Paris","city":"Tokyo"}"#);
        assert_eq!(req.country.as_deref(), Some("US"));
        assert_eq!(req.city.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_bad_field_keeps_the_others() {
        let req = FlagRequest::from_body(br#"{"latitude":{"deg":37},"country":"US","city":"Tokyo"}"#);
        assert_eq!(req.latitude, None);
        assert_eq!(req.country.as_deref(), Some("US"));
        assert_eq!(req.city.as_deref(), Some("Tokyo"));
    }
}
