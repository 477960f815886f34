//! Walking-route acquisition between two coordinates
//!
//! Two interchangeable providers sit behind [`RouteProvider`]. The offline
//! street-graph provider surfaces failures as [`RoutingError`], while the
//! directions-API provider reports every failure as an absent route.

pub mod directions;
pub mod error;
pub mod graph;

pub use directions::DirectionsProvider;
pub use error::RoutingError;
pub use graph::{GraphSource, OfflineGraphProvider};

use tracing::instrument;

use crate::models::RoutePath;

#[derive(Debug, Clone)]
pub enum RouteProvider {
    /// Shortest path over a walkable street graph fetched around the origin
    OfflineGraph(OfflineGraphProvider),
    /// External directions service, requires an access token
    Directions(DirectionsProvider),
}

impl RouteProvider {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RouteProvider::OfflineGraph(_) => "offline-graph",
            RouteProvider::Directions(_) => "directions-api",
        }
    }

    /// Route from origin to destination.
    ///
    /// `Ok(None)` only comes from the directions provider; the offline provider
    /// either yields a path or an error.
    #[instrument(level = "debug", skip(self), fields(provider = self.name()))]
    pub async fn route(
        &self,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
    ) -> error::Result<Option<RoutePath>> {
        match self {
            RouteProvider::OfflineGraph(provider) => provider
                .route(origin_lat, origin_lon, dest_lat, dest_lon)
                .await
                .map(Some),
            RouteProvider::Directions(provider) => Ok(provider
                .route(origin_lat, origin_lon, dest_lat, dest_lon)
                .await),
        }
    }
}

impl From<OfflineGraphProvider> for RouteProvider {
    fn from(provider: OfflineGraphProvider) -> Self {
        RouteProvider::OfflineGraph(provider)
    }
}

impl From<DirectionsProvider> for RouteProvider {
    fn from(provider: DirectionsProvider) -> Self {
        RouteProvider::Directions(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_directions_without_token_is_absent_not_error() {
        let provider: RouteProvider = DirectionsProvider::new(None).into();
        assert_eq!(provider.name(), "directions-api");

        let result = provider.route(28.605, 77.205, 28.61, 77.21).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_offline_without_street_data_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"elements": []}}"#).unwrap();

        let provider: RouteProvider =
            OfflineGraphProvider::new(GraphSource::File(file.path().to_path_buf())).into();
        assert_eq!(provider.name(), "offline-graph");

        let err = provider.route(28.605, 77.205, 28.61, 77.21).await.unwrap_err();
        assert!(matches!(err, RoutingError::EmptyGraph { .. }));
    }
}
