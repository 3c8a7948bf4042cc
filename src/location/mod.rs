//! Location subsystem.
//!
//! Provides device/IP geolocation providers, the manual-location catalog,
//! timezone-based defaults, and the resolver that chains them.

pub mod catalog;
pub mod providers;
pub mod resolver;
pub mod timezone;
pub mod types;

pub use catalog::{find_option, manual_location_options};
pub use resolver::{LocationResolver, ManualCatalog, ManualPicker, PresetChoice, Resolution, SkipManual, Step};
pub use types::{
    Coordinates, LocationError, LocationEstimate, LocationMethod, ManualLocationOption, Place, PositionOptions,
};
