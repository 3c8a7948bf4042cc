//! Location resolver: orchestrates the progressive fallback chain.
//!
//! Device → IP (ipinfo.io, then ip-api.com) → manual pick → timezone default.
//! Each step runs only after every earlier one failed; nothing is retried.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info, warn};

use super::catalog::find_option;
use super::providers::{BigDataCloud, IpApi, IpInfo, IpLookup, NoDevice, PositionSource, ReverseGeocoder};
use super::timezone::{country_for_timezone, detect_local_timezone};
use super::types::{Coordinates, LocationError, LocationEstimate, ManualLocationOption, PositionOptions};

// ─── Manual selection seams ──────────────────────────────────────

/// Where the manual-location catalog comes from.
pub trait ManualCatalog: Send + Sync {
    /// Returns an empty list when the catalog cannot be fetched.
    fn manual_locations(&self) -> Vec<ManualLocationOption>;
}

/// Presents the catalog for explicit choice. `None` means "skip".
pub trait ManualPicker {
    fn choose(&self, options: &[ManualLocationOption]) -> Option<ManualLocationOption>;
}

/// No catalog at all.
pub struct NoCatalog;

impl ManualCatalog for NoCatalog {
    fn manual_locations(&self) -> Vec<ManualLocationOption> {
        Vec::new()
    }
}

/// Always declines manual selection.
pub struct SkipManual;

impl ManualPicker for SkipManual {
    fn choose(&self, _options: &[ManualLocationOption]) -> Option<ManualLocationOption> {
        None
    }
}

/// Picks a preset city name or country code, if the catalog offers it.
pub struct PresetChoice(pub String);

impl ManualPicker for PresetChoice {
    fn choose(&self, options: &[ManualLocationOption]) -> Option<ManualLocationOption> {
        let found = find_option(options, &self.0).cloned();
        if found.is_none() {
            warn!(choice = %self.0, "Preset manual choice not in catalog");
        }
        found
    }
}

// ─── Resolver ────────────────────────────────────────────────────

/// A step of the fallback chain, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Device,
    Ip,
    Manual,
    Default,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "Browser Geolocation"),
            Self::Ip => write!(f, "IP Geolocation"),
            Self::Manual => write!(f, "Manual Selection"),
            Self::Default => write!(f, "Default Location"),
        }
    }
}

/// The estimate plus the steps entered to get it.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub estimate: LocationEstimate,
    pub steps: Vec<Step>,
}

type Attempt = fn(&LocationResolver) -> Option<LocationEstimate>;

/// The location resolver with its fallback pipeline.
pub struct LocationResolver {
    device: Arc<dyn PositionSource>,
    geocoder: Box<dyn ReverseGeocoder>,
    ip_services: Vec<Box<dyn IpLookup>>,
    catalog: Box<dyn ManualCatalog>,
    picker: Box<dyn ManualPicker>,
    timezone: Option<String>,
    position_options: PositionOptions,
}

impl LocationResolver {
    /// Public providers, no device, no catalog, auto-detected timezone.
    pub fn new() -> Self {
        Self {
            device: Arc::new(NoDevice),
            geocoder: Box::new(BigDataCloud::default()),
            ip_services: vec![Box::new(IpInfo::default()), Box::new(IpApi::default())],
            catalog: Box::new(NoCatalog),
            picker: Box::new(SkipManual),
            timezone: detect_local_timezone(),
            position_options: PositionOptions::default(),
        }
    }

    pub fn with_device(mut self, device: impl PositionSource + 'static) -> Self {
        self.device = Arc::new(device);
        self
    }

    pub fn with_geocoder(mut self, geocoder: impl ReverseGeocoder + 'static) -> Self {
        self.geocoder = Box::new(geocoder);
        self
    }

    /// Replace the IP services; they are queried in the given order.
    pub fn with_ip_services(mut self, services: Vec<Box<dyn IpLookup>>) -> Self {
        self.ip_services = services;
        self
    }

    pub fn with_catalog(mut self, catalog: impl ManualCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    pub fn with_picker(mut self, picker: impl ManualPicker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn with_timezone(mut self, timezone: Option<String>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_position_options(mut self, opts: PositionOptions) -> Self {
        self.position_options = opts;
        self
    }

    /// Walk the chain until a step produces an estimate.
    pub fn resolve(&self) -> Resolution {
        let chain: [(Step, Attempt); 3] = [
            (Step::Device, LocationResolver::try_device),
            (Step::Ip, LocationResolver::try_ip),
            (Step::Manual, LocationResolver::try_manual),
        ];

        let mut steps = Vec::with_capacity(4);
        for (step, attempt) in chain {
            steps.push(step);
            if let Some(estimate) = attempt(self) {
                info!(step = %step, location = %estimate.summary(), "Location resolved");
                return Resolution { estimate, steps };
            }
        }

        steps.push(Step::Default);
        let estimate = self.default_location();
        info!(step = %Step::Default, location = %estimate.summary(), "Location resolved");
        Resolution { estimate, steps }
    }

    fn try_device(&self) -> Option<LocationEstimate> {
        let coords = match self.request_position() {
            Ok(c) => c,
            Err(e) => {
                debug!(error = %e, "Device geolocation failed");
                return None;
            }
        };

        let place = match self.geocoder.reverse(coords) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, keeping bare coordinates");
                None
            }
        };

        Some(LocationEstimate::from_device(coords, place))
    }

    /// Ask the device for a fix, giving up after the configured timeout even
    /// if the source itself keeps blocking.
    fn request_position(&self) -> Result<Coordinates, LocationError> {
        let opts = self.position_options;
        let device = Arc::clone(&self.device);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let _ = tx.send(device.current_position(&opts));
        });

        match rx.recv_timeout(opts.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LocationError::Timeout(opts.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(LocationError::Unavailable),
        }
    }

    fn try_ip(&self) -> Option<LocationEstimate> {
        for service in &self.ip_services {
            match service.lookup() {
                Ok((country, city)) => {
                    debug!(service = service.name(), %country, %city, "IP geolocation succeeded");
                    return Some(LocationEstimate::from_ip(country, city));
                }
                Err(e) => debug!(service = service.name(), error = %e, "IP geolocation failed"),
            }
        }
        None
    }

    fn try_manual(&self) -> Option<LocationEstimate> {
        let options = self.catalog.manual_locations();
        if options.is_empty() {
            debug!("Manual catalog is empty");
        }
        match self.picker.choose(&options) {
            Some(option) => Some(LocationEstimate::from_manual(&option)),
            None => {
                debug!("Manual selection skipped");
                None
            }
        }
    }

    fn default_location(&self) -> LocationEstimate {
        let country = country_for_timezone(self.timezone.as_deref());
        LocationEstimate::from_default(country)
    }
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new()
    }
}
