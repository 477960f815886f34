//! Location models for risk-scored reference points and query coordinates

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::distance::distance;

/// Ordinal safety classification of a location
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Every level, lowest risk first
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
    ];

    /// Levels treated as safe when the caller does not choose any
    pub const SAFE_DEFAULT: [RiskLevel; 2] = [RiskLevel::VeryLow, RiskLevel::Low];

    /// Label as it appears in the risk dataset
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "Very Low",
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "verylow" => Ok(RiskLevel::VeryLow),
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            _ => Err(format!("Unknown risk level '{}'", s.trim())),
        }
    }
}

impl TryFrom<String> for RiskLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

/// One risk-scored reference point from the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Station identifier
    pub name: String,
    pub area: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

impl LocationRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        area: impl Into<String>,
        latitude: f64,
        longitude: f64,
        risk_score: f64,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            name: name.into(),
            area: area.into(),
            latitude,
            longitude,
            risk_score,
            risk_level,
        }
    }

    /// Distance in kilometres from the query point to this record
    #[must_use]
    pub fn distance_to(&self, point: &QueryPoint) -> f64 {
        distance(point.latitude, point.longitude, self.latitude, self.longitude)
    }

    /// Coordinates as a `(lat, lon)` pair
    #[must_use]
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Caller supplied coordinates for a single lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl QueryPoint {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for QueryPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl From<&LocationRecord> for QueryPoint {
    fn from(record: &LocationRecord) -> Self {
        Self::new(record.latitude, record.longitude)
    }
}

/// A record paired with its distance to a specific query point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub record: LocationRecord,
    pub distance_km: f64,
}

impl RankedResult {
    /// Rank a record against a query point
    #[must_use]
    pub fn new(record: &LocationRecord, point: &QueryPoint) -> Self {
        Self {
            distance_km: record.distance_to(point),
            record: record.clone(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        self.record.risk_level
    }
}
