//! Dataset-level risk analytics
//!
//! Level counts, rankings by risk score and the zone assessment shown for a
//! query point's nearest location.

use std::fmt;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::models::{LocationRecord, RankedResult, RiskLevel};

/// Number of locations at each risk level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskSummary {
    pub total: usize,
    pub very_low: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RiskSummary {
    #[must_use]
    pub fn from_dataset(dataset: &Dataset) -> Self {
        dataset.iter().fold(Self::default(), |mut summary, record| {
            summary.total += 1;
            match record.risk_level {
                RiskLevel::VeryLow => summary.very_low += 1,
                RiskLevel::Low => summary.low += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::High => summary.high += 1,
            }
            summary
        })
    }

    #[must_use]
    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::VeryLow => self.very_low,
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
        }
    }

    /// Locations rated Low or Very Low
    #[must_use]
    pub fn low_or_very_low(&self) -> usize {
        self.low + self.very_low
    }
}

/// The `n` highest-scoring locations, highest first
#[must_use]
pub fn top_unsafe(dataset: &Dataset, n: usize) -> Vec<&LocationRecord> {
    let mut records: Vec<&LocationRecord> = dataset.iter().collect();
    records.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    records.truncate(n);
    records
}

/// The `n` lowest-scoring locations, lowest first
#[must_use]
pub fn top_safe(dataset: &Dataset, n: usize) -> Vec<&LocationRecord> {
    let mut records: Vec<&LocationRecord> = dataset.iter().collect();
    records.sort_by(|a, b| a.risk_score.total_cmp(&b.risk_score));
    records.truncate(n);
    records
}

/// Records whose level is one of `levels`, in dataset order
#[must_use]
pub fn filter_by_levels<'a>(dataset: &'a Dataset, levels: &[RiskLevel]) -> Vec<&'a LocationRecord> {
    dataset
        .iter()
        .filter(|record| levels.contains(&record.risk_level))
        .collect()
}

/// `(latitude, longitude, risk_score)` triples for heatmap rendering
#[must_use]
pub fn heat_points<'a, I>(records: I) -> Vec<(f64, f64, f64)>
where
    I: IntoIterator<Item = &'a LocationRecord>,
{
    records
        .into_iter()
        .map(|record| (record.latitude, record.longitude, record.risk_score))
        .collect()
}

/// Coarse safety status of the zone around a query point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneStatus {
    HighRisk,
    MediumRisk,
    Safer,
}

impl From<RiskLevel> for ZoneStatus {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => ZoneStatus::HighRisk,
            RiskLevel::Medium => ZoneStatus::MediumRisk,
            RiskLevel::Low | RiskLevel::VeryLow => ZoneStatus::Safer,
        }
    }
}

impl ZoneStatus {
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            ZoneStatus::HighRisk => "You are in or near a HIGH-RISK zone.",
            ZoneStatus::MediumRisk => "You are in a MEDIUM-RISK zone.",
            ZoneStatus::Safer => "You are in a safer zone.",
        }
    }

    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, ZoneStatus::Safer)
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Assessment of the zone a query point falls in, from its nearest location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneAssessment {
    pub nearest: RankedResult,
    pub status: ZoneStatus,
}

impl ZoneAssessment {
    #[must_use]
    pub fn new(nearest: RankedResult) -> Self {
        let status = ZoneStatus::from(nearest.risk_level());
        Self { nearest, status }
    }

    /// One-line description of the nearest location
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Nearest station: {} - {} ({:.2} km), risk level {}, risk score {:.2}",
            self.nearest.record.name,
            self.nearest.record.area,
            self.nearest.distance_km,
            self.nearest.record.risk_level,
            self.nearest.record.risk_score
        )
    }
}
