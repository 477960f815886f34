//! Great-circle distance between geographic coordinates

use haversine::{Location as HaversineLocation, Units, distance as haversine_distance};

/// Mean Earth radius used by the haversine formula, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two lat/lon points (degrees) in kilometres.
///
/// NaN inputs propagate to a NaN result.
#[must_use]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_distance(
        HaversineLocation {
            latitude: lat1,
            longitude: lon1,
        },
        HaversineLocation {
            latitude: lat2,
            longitude: lon2,
        },
        Units::Kilometers,
    )
}

/// Same as [`distance`] in metres, used for street graph edge lengths
#[must_use]
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    distance(lat1, lon1, lat2, lon2) * 1000.0
}
