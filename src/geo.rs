//! Geography helpers: coordinates, distances, and the tolerant parsers for
//! the catalog's human-readable distance/duration labels.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Saved home location, read from the `home.location` store key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeLocation {
    pub label: String,
    pub lat: f64,
    pub lng: f64,
}

impl HomeLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Fallback reference point when neither a live reading nor a saved home
/// location is available: the campus square fountain.
pub const DEFAULT_REFERENCE: GeoPoint = GeoPoint {
    lat: 44.5646,
    lng: -123.2790,
};

/// Resolve the base location for distance math: live reading first, then
/// saved home, then the fixed campus-square reference. Never fails.
pub fn resolve_base(live: Option<GeoPoint>, home: Option<&HomeLocation>) -> GeoPoint {
    live.or_else(|| home.map(HomeLocation::point))
        .unwrap_or(DEFAULT_REFERENCE)
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Parse a duration label like `"45 min"`, `"2 hr"`, or `"1 hr 30 min"`
/// into minutes. Unrecognised labels yield `None`.
pub fn parse_duration_minutes(label: &str) -> Option<u32> {
    let hours = Regex::new(r"(?i)(\d+)\s*(?:hr|hour)s?\b").ok()?;
    let minutes = Regex::new(r"(?i)(\d+)\s*(?:min|minute)s?\b").ok()?;

    let h: u32 = hours
        .captures(label)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let m: u32 = minutes
        .captures(label)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    if h == 0 && m == 0 {
        return None;
    }
    Some(h * 60 + m)
}

/// Parse a distance label like `"1.2 km"` or `"800 m"` into kilometres.
pub fn parse_distance_km(label: &str) -> Option<f64> {
    let re = Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(km|m)\b").ok()?;
    let caps = re.captures(label)?;
    let value: f64 = caps[1].parse().ok()?;
    match &caps[2].to_ascii_lowercase()[..] {
        "km" => Some(value),
        "m" => Some(value / 1000.0),
        _ => None,
    }
}
