//! `SafeRoute` - Nearest safe-location search and walking routes over risk-scored places
//!
//! This library loads a risk-scored location dataset, finds the nearest and
//! nearest safe locations to a point, and fetches a walking route to the
//! closest safe one from a street graph or a directions API.

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod logging;
pub mod models;
pub mod navigator;
pub mod routing;
pub mod search;

// Re-export core types for public API
pub use analytics::{RiskSummary, ZoneAssessment, ZoneStatus};
pub use config::SafeRouteConfig;
pub use dataset::{Dataset, DatasetCache};
pub use distance::distance;
pub use error::SafeRouteError;
pub use models::{LocationRecord, QueryPoint, RankedResult, RiskLevel, RoutePath};
pub use navigator::{RouteOutcome, SafetyNavigator, SafetyPlan};
pub use routing::{DirectionsProvider, GraphSource, OfflineGraphProvider, RouteProvider, RoutingError};
pub use search::{find_nearest, find_nearest_safe};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SafeRouteError>;
