//! geoflags: progressive location detection and location-based feature flags.
//!
//! The client half walks a fallback chain (device → IP → manual → default)
//! to produce a [`location::LocationEstimate`]; the server half maps an
//! estimate to a [`flags::FeatureFlags`] record.

pub mod client;
pub mod config;
pub mod flags;
pub mod location;
pub mod server;
