//! Route path model

use serde::{Deserialize, Serialize};

use crate::distance::distance;

/// Ordered `(lat, lon)` coordinates describing a walkable path from origin to destination
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutePath {
    points: Vec<(f64, f64)>,
}

impl RoutePath {
    #[must_use]
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Build from `[lon, lat]` pairs as used by GeoJSON geometries
    #[must_use]
    pub fn from_lon_lat(coordinates: &[[f64; 2]]) -> Self {
        Self {
            points: coordinates.iter().map(|[lon, lat]| (*lat, *lon)).collect(),
        }
    }

    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    #[must_use]
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<(f64, f64)> {
        self.points.first().copied()
    }

    #[must_use]
    pub fn last(&self) -> Option<(f64, f64)> {
        self.points.last().copied()
    }

    /// Sum of great-circle segment lengths in kilometres
    #[must_use]
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| distance(w[0].0, w[0].1, w[1].0, w[1].1))
            .sum()
    }
}
