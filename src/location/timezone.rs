//! Timezone → country lookup for the default fallback, plus local timezone
//! detection.

use chrono_tz::Tz;
use std::fs;
use std::path::Path;

/// Country assumed when the timezone is unmapped or unknown.
pub const FALLBACK_COUNTRY: &str = "US";

/// Backward-compatible link names that chrono-tz keeps as zones of their
/// own, mapped to the canonical zone of the same country.
const ZONE_LINKS: &[(&str, &str)] = &[
    ("US/Eastern", "America/New_York"),
    ("US/Central", "America/Chicago"),
    ("US/Mountain", "America/Denver"),
    ("Navajo", "America/Denver"),
    ("America/Shiprock", "America/Denver"),
    ("US/Pacific", "America/Los_Angeles"),
    ("GB", "Europe/London"),
    ("GB-Eire", "Europe/London"),
    ("Europe/Belfast", "Europe/London"),
    ("Japan", "Asia/Tokyo"),
    ("PRC", "Asia/Shanghai"),
    ("Asia/Chongqing", "Asia/Shanghai"),
    ("Asia/Chungking", "Asia/Shanghai"),
    ("Asia/Harbin", "Asia/Shanghai"),
    ("Australia/ACT", "Australia/Sydney"),
    ("Australia/Canberra", "Australia/Sydney"),
    ("Australia/NSW", "Australia/Sydney"),
];

fn canonical_zone(name: &str) -> &str {
    ZONE_LINKS
        .iter()
        .find(|(link, _)| *link == name)
        .map(|(_, target)| *target)
        .unwrap_or(name)
}

/// Map an IANA timezone name to a coarse country code.
pub fn country_for_timezone(tz: Option<&str>) -> &'static str {
    let Some(tz) = tz.and_then(|s| s.parse::<Tz>().ok()) else {
        return FALLBACK_COUNTRY;
    };
    match canonical_zone(tz.name()) {
        "America/New_York" | "America/Chicago" | "America/Denver" | "America/Los_Angeles" => "US",
        "Europe/London" => "UK",
        "Europe/Paris" => "FR",
        "Europe/Berlin" => "DE",
        "Asia/Tokyo" => "JP",
        "Asia/Shanghai" => "CN",
        "Australia/Sydney" => "AU",
        _ => FALLBACK_COUNTRY,
    }
}

/// Best-effort detection of the host's IANA timezone.
///
/// Order: `TZ` env var, `/etc/timezone`, `/etc/localtime` symlink target.
pub fn detect_local_timezone() -> Option<String> {
    if let Some(tz) = std::env::var("TZ").ok().and_then(|v| normalize(&v)) {
        return Some(tz);
    }
    if let Some(tz) = fs::read_to_string("/etc/timezone").ok().and_then(|v| normalize(&v)) {
        return Some(tz);
    }
    fs::read_link("/etc/localtime")
        .ok()
        .and_then(|target| tz_from_zoneinfo_path(&target))
}

/// Accept a candidate only if chrono-tz knows it.
fn normalize(raw: &str) -> Option<String> {
    let s = raw.trim().trim_start_matches(':');
    s.parse::<Tz>().ok().map(|tz| tz.name().to_string())
}

/// `/usr/share/zoneinfo/Europe/Paris` → `Europe/Paris`
fn tz_from_zoneinfo_path(path: &Path) -> Option<String> {
    let s = path.to_string_lossy();
    let idx = s.find("zoneinfo/")?;
    normalize(&s[idx + "zoneinfo/".len()..])
}
