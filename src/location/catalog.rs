//! Built-in catalog of manually selectable locations.

use super::types::ManualLocationOption;

struct CatalogEntry {
    city: &'static str,
    country: &'static str,
    country_code: &'static str,
    region: &'static str,
}

const MANUAL_LOCATIONS: &[CatalogEntry] = &[
    CatalogEntry { city: "New York", country: "United States", country_code: "US", region: "North America" },
    CatalogEntry { city: "London", country: "United Kingdom", country_code: "UK", region: "Europe" },
    CatalogEntry { city: "Tokyo", country: "Japan", country_code: "JP", region: "Asia" },
    CatalogEntry { city: "Sydney", country: "Australia", country_code: "AU", region: "Oceania" },
    CatalogEntry { city: "Mumbai", country: "India", country_code: "IN", region: "Asia" },
    CatalogEntry { city: "Toronto", country: "Canada", country_code: "CA", region: "North America" },
    CatalogEntry { city: "Berlin", country: "Germany", country_code: "DE", region: "Europe" },
    CatalogEntry { city: "Paris", country: "France", country_code: "FR", region: "Europe" },
    CatalogEntry { city: "Singapore", country: "Singapore", country_code: "SG", region: "Asia" },
    CatalogEntry { city: "São Paulo", country: "Brazil", country_code: "BR", region: "South America" },
    CatalogEntry { city: "Mexico City", country: "Mexico", country_code: "MX", region: "North America" },
    CatalogEntry { city: "Cape Town", country: "South Africa", country_code: "ZA", region: "Africa" },
];

/// Return the full manual-location catalog.
pub fn manual_location_options() -> Vec<ManualLocationOption> {
    MANUAL_LOCATIONS
        .iter()
        .map(|e| ManualLocationOption {
            city: e.city.to_string(),
            country: e.country.to_string(),
            country_code: e.country_code.to_string(),
            region: Some(e.region.to_string()),
        })
        .collect()
}

/// Find a catalog option by city name (case-insensitive) or country code.
pub fn find_option<'a>(
    options: &'a [ManualLocationOption],
    query: &str,
) -> Option<&'a ManualLocationOption> {
    let q = query.trim().to_lowercase();
    options
        .iter()
        .find(|o| o.city.to_lowercase() == q)
        .or_else(|| options.iter().find(|o| o.country_code.to_lowercase() == q))
}
