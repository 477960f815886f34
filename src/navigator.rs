//! Caller-facing safety navigation over a loaded risk dataset

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::analytics::{self, RiskSummary, ZoneAssessment};
use crate::config::SafeRouteConfig;
use crate::dataset::{Clock, Dataset, DatasetCache, cache};
use crate::models::{LocationRecord, QueryPoint, RankedResult, RiskLevel, RoutePath};
use crate::routing::RouteProvider;
use crate::search;
use crate::{Result, SafeRouteError};

/// Result of asking a provider for a route to the nearest safe location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RouteOutcome {
    Found(RoutePath),
    /// The provider is not configured or could not produce a route
    Unavailable,
    /// The provider raised an error
    Failed { reason: String },
    /// No location in the dataset has a safe risk level
    NoSafeDestination,
}

impl RouteOutcome {
    #[must_use]
    pub fn path(&self) -> Option<&RoutePath> {
        match self {
            RouteOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }

    /// Status line for presentation layers
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            RouteOutcome::Found(_) => "Route generated successfully!",
            RouteOutcome::Unavailable | RouteOutcome::Failed { .. } => "Failed to generate route.",
            RouteOutcome::NoSafeDestination => "No safe location found in the dataset.",
        }
    }
}

/// Everything known about a query point: its zone, nearby safe locations and
/// a route to the closest of them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyPlan {
    pub point: QueryPoint,
    pub assessment: ZoneAssessment,
    pub safe_locations: Vec<RankedResult>,
    pub route: RouteOutcome,
}

impl SafetyPlan {
    /// Closest safe location, the route destination
    #[must_use]
    pub fn destination(&self) -> Option<&RankedResult> {
        self.safe_locations.first()
    }
}

#[derive(Debug, Clone)]
pub struct SafetyNavigator {
    dataset: Arc<Dataset>,
    safe_levels: Vec<RiskLevel>,
    top_n: usize,
}

impl SafetyNavigator {
    /// Navigator with the default safe levels and three results per query
    #[must_use]
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self {
            dataset,
            safe_levels: RiskLevel::SAFE_DEFAULT.to_vec(),
            top_n: 3,
        }
    }

    /// Navigator over the dataset at `path`, loaded through the process-wide cache
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(cache::global().load(path)?))
    }

    /// Navigator over the configured dataset, loaded through `cache`
    pub fn from_config<C: Clock>(config: &SafeRouteConfig, cache: &DatasetCache<C>) -> Result<Self> {
        let path = config
            .dataset
            .path
            .as_ref()
            .ok_or_else(|| SafeRouteError::config("No dataset path configured"))?;

        Ok(Self::new(cache.load(path)?)
            .with_safe_levels(config.defaults.safe_levels.clone())
            .with_top_n(config.defaults.top_n))
    }

    #[must_use]
    pub fn with_safe_levels(mut self, safe_levels: Vec<RiskLevel>) -> Self {
        self.safe_levels = safe_levels;
        self
    }

    /// Safe locations returned by `plan`, at least one
    #[must_use]
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    #[must_use]
    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    #[must_use]
    pub fn safe_levels(&self) -> &[RiskLevel] {
        &self.safe_levels
    }

    pub fn find_nearest(&self, point: &QueryPoint) -> Result<RankedResult> {
        search::find_nearest(&self.dataset, point)
    }

    #[must_use]
    pub fn find_nearest_safe(&self, point: &QueryPoint, top_n: usize) -> Vec<RankedResult> {
        search::find_nearest_safe(&self.dataset, point, &self.safe_levels, top_n)
    }

    /// Route between two points with the chosen provider
    pub async fn route(
        &self,
        provider: &RouteProvider,
        origin: &QueryPoint,
        destination: &QueryPoint,
    ) -> Result<Option<RoutePath>> {
        let path = provider
            .route(
                origin.latitude,
                origin.longitude,
                destination.latitude,
                destination.longitude,
            )
            .await?;
        Ok(path)
    }

    /// Assess the zone around `point` and route to the nearest safe location.
    ///
    /// Routing problems are reported in [`SafetyPlan::route`]; only an empty
    /// dataset fails the whole plan.
    #[instrument(skip(self, provider), fields(provider = provider.name()))]
    pub async fn plan(&self, point: QueryPoint, provider: &RouteProvider) -> Result<SafetyPlan> {
        let assessment = ZoneAssessment::new(self.find_nearest(&point)?);
        let safe_locations = self.find_nearest_safe(&point, self.top_n);

        let route = match safe_locations.first() {
            None => {
                warn!("No location with levels {:?} to route to", self.safe_levels);
                RouteOutcome::NoSafeDestination
            }
            Some(destination) => {
                let target = QueryPoint::from(&destination.record);
                match self.route(provider, &point, &target).await {
                    Ok(Some(path)) => {
                        info!(
                            "Route to {} has {} points ({:.2} km)",
                            destination.name(),
                            path.len(),
                            path.length_km()
                        );
                        RouteOutcome::Found(path)
                    }
                    Ok(None) => RouteOutcome::Unavailable,
                    Err(e) => {
                        warn!("Routing to {} failed: {}", destination.name(), e);
                        RouteOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        Ok(SafetyPlan {
            point,
            assessment,
            safe_locations,
            route,
        })
    }

    #[must_use]
    pub fn summary(&self) -> RiskSummary {
        RiskSummary::from_dataset(&self.dataset)
    }

    #[must_use]
    pub fn top_unsafe(&self, n: usize) -> Vec<&LocationRecord> {
        analytics::top_unsafe(&self.dataset, n)
    }

    #[must_use]
    pub fn top_safe(&self, n: usize) -> Vec<&LocationRecord> {
        analytics::top_safe(&self.dataset, n)
    }
}
