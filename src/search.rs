//! Nearest-location search over a risk dataset
//!
//! Brute-force scans; datasets are small enough that no spatial index is kept.
//! Equidistant records always resolve to the one that appears first in the
//! dataset.

use tracing::debug;

use crate::dataset::Dataset;
use crate::models::{QueryPoint, RankedResult, RiskLevel};
use crate::{Result, SafeRouteError};

/// Find the record closest to `point`.
///
/// # Errors
///
/// [`SafeRouteError::EmptyDataset`] when the dataset has no records.
pub fn find_nearest(dataset: &Dataset, point: &QueryPoint) -> Result<RankedResult> {
    let mut best: Option<(usize, f64)> = None;

    for (index, record) in dataset.iter().enumerate() {
        let distance = record.distance_to(point);
        // strict comparison keeps the earliest record on ties; NaN never wins over a number
        let closer = match best {
            None => true,
            Some((_, best_distance)) => {
                distance < best_distance || (best_distance.is_nan() && !distance.is_nan())
            }
        };
        if closer {
            best = Some((index, distance));
        }
    }

    let (index, distance_km) = best.ok_or(SafeRouteError::EmptyDataset)?;
    let record = dataset.records()[index].clone();

    debug!(
        "Nearest location to ({}) is {} at {:.3} km",
        point.format_coordinates(),
        record.name,
        distance_km
    );

    Ok(RankedResult {
        record,
        distance_km,
    })
}

/// Find up to `top_n` records whose risk level is in `safe_levels`, closest first.
///
/// Fewer qualifying records than `top_n` yields all of them, and none yields an
/// empty vector.
#[must_use]
pub fn find_nearest_safe(
    dataset: &Dataset,
    point: &QueryPoint,
    safe_levels: &[RiskLevel],
    top_n: usize,
) -> Vec<RankedResult> {
    let mut ranked: Vec<RankedResult> = dataset
        .iter()
        .filter(|record| safe_levels.contains(&record.risk_level))
        .map(|record| RankedResult::new(record, point))
        .collect();

    // stable sort keeps dataset order among equal distances
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.truncate(top_n);

    debug!(
        "Found {} safe locations near ({}) for levels {:?}",
        ranked.len(),
        point.format_coordinates(),
        safe_levels
    );

    ranked
}

/// [`find_nearest_safe`] with the default safe levels (Very Low and Low)
#[must_use]
pub fn find_nearest_safe_default(
    dataset: &Dataset,
    point: &QueryPoint,
    top_n: usize,
) -> Vec<RankedResult> {
    find_nearest_safe(dataset, point, &RiskLevel::SAFE_DEFAULT, top_n)
}
