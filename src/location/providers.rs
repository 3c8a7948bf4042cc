//! Location providers: device position sources, BigDataCloud reverse
//! geocoding, and the ipinfo.io / ip-api.com IP lookups.

use super::types::{Coordinates, LocationError, Place, PositionOptions};
use serde::Deserialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("geoflags/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_REVERSE_GEOCODE_URL: &str =
    "https://api.bigdatacloud.net/data/reverse-geocode-client";
pub const DEFAULT_IPINFO_URL: &str = "https://ipinfo.io/json";
pub const DEFAULT_IP_API_URL: &str = "http://ip-api.com/json/";

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().user_agent(USER_AGENT).build()
}

fn network_error(e: ureq::Error) -> LocationError {
    LocationError::Network(e.to_string())
}

/// Empty strings count as missing, matching how the lookup services
/// report unknown fields.
fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ─── Device position ─────────────────────────────────────────────

/// A device geolocation capability.
pub trait PositionSource: Send + Sync {
    fn current_position(&self, opts: &PositionOptions) -> Result<Coordinates, LocationError>;
}

/// A host with no geolocation capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

impl PositionSource for NoDevice {
    fn current_position(&self, _opts: &PositionOptions) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// A previously acquired fix, e.g. supplied on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition {
    pub coords: Coordinates,
    /// How long ago the fix was taken.
    pub age: Duration,
}

impl FixedPosition {
    pub fn fresh(latitude: f64, longitude: f64) -> Self {
        Self {
            coords: Coordinates { latitude, longitude },
            age: Duration::ZERO,
        }
    }
}

impl PositionSource for FixedPosition {
    fn current_position(&self, opts: &PositionOptions) -> Result<Coordinates, LocationError> {
        if self.age > opts.maximum_age {
            return Err(LocationError::Stale { age: self.age, max: opts.maximum_age });
        }
        Ok(self.coords)
    }
}

// ─── Reverse geocoding ───────────────────────────────────────────

/// Coordinates → place names.
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(&self, coords: Coordinates) -> Result<Place, LocationError>;
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct BigDataCloudResult {
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    locality: Option<String>,
}

impl BigDataCloudResult {
    fn into_place(self) -> Place {
        Place {
            country: non_empty(self.country_name),
            city: non_empty(self.city).or_else(|| non_empty(self.locality)),
        }
    }
}

/// BigDataCloud's keyless client-side reverse geocoder.
pub struct BigDataCloud {
    agent: ureq::Agent,
    url: String,
}

impl BigDataCloud {
    pub fn new(url: impl Into<String>) -> Self {
        Self { agent: agent(), url: url.into() }
    }
}

impl Default for BigDataCloud {
    fn default() -> Self {
        Self::new(DEFAULT_REVERSE_GEOCODE_URL)
    }
}

impl ReverseGeocoder for BigDataCloud {
    fn reverse(&self, coords: Coordinates) -> Result<Place, LocationError> {
        let response = self
            .agent
            .get(&self.url)
            .query("latitude", &coords.latitude.to_string())
            .query("longitude", &coords.longitude.to_string())
            .query("localityLanguage", "en")
            .call()
            .map_err(network_error)?;

        let r: BigDataCloudResult = response
            .into_json()
            .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;

        Ok(r.into_place())
    }
}

// ─── IP-based geolocation ────────────────────────────────────────

/// A service that places the caller by its public IP.
pub trait IpLookup: Send + Sync {
    fn name(&self) -> &str;
    /// Returns `(country, city)`; both must be non-empty.
    fn lookup(&self) -> Result<(String, String), LocationError>;
}

#[derive(Deserialize, Debug)]
struct IpPlaceResult {
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

impl IpPlaceResult {
    fn usable_pair(self) -> Result<(String, String), LocationError> {
        match (non_empty(self.country), non_empty(self.city)) {
            (Some(country), Some(city)) => Ok((country, city)),
            _ => Err(LocationError::Incomplete),
        }
    }
}

fn fetch_ip_place(agent: &ureq::Agent, url: &str) -> Result<(String, String), LocationError> {
    let response = agent.get(url).call().map_err(network_error)?;
    let r: IpPlaceResult = response
        .into_json()
        .map_err(|e| LocationError::InvalidResponse(e.to_string()))?;
    r.usable_pair()
}

/// ipinfo.io: `country` is an ISO code.
pub struct IpInfo {
    agent: ureq::Agent,
    url: String,
}

impl IpInfo {
    pub fn new(url: impl Into<String>) -> Self {
        Self { agent: agent(), url: url.into() }
    }
}

impl Default for IpInfo {
    fn default() -> Self {
        Self::new(DEFAULT_IPINFO_URL)
    }
}

impl IpLookup for IpInfo {
    fn name(&self) -> &str {
        "ipinfo.io"
    }

    fn lookup(&self) -> Result<(String, String), LocationError> {
        fetch_ip_place(&self.agent, &self.url)
    }
}

/// ip-api.com: `country` is a display name.
pub struct IpApi {
    agent: ureq::Agent,
    url: String,
}

impl IpApi {
    pub fn new(url: impl Into<String>) -> Self {
        Self { agent: agent(), url: url.into() }
    }
}

impl Default for IpApi {
    fn default() -> Self {
        Self::new(DEFAULT_IP_API_URL)
    }
}

impl IpLookup for IpApi {
    fn name(&self) -> &str {
        "ip-api.com"
    }

    fn lookup(&self) -> Result<(String, String), LocationError> {
        fetch_ip_place(&self.agent, &self.url)
    }
}
