//! Online walking routes from a Mapbox-style directions API.
//!
//! Failures here are soft: a missing token, a network error, a non-success
//! status or an unexpected body all produce `None`, never an error.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::DirectionsConfig;
use crate::models::RoutePath;

pub const MAPBOX_DIRECTIONS_URL: &str = "https://api.mapbox.com/directions/v5/mapbox";

pub const DEFAULT_PROFILE: &str = "walking";

pub const DEFAULT_DIRECTIONS_TIMEOUT: Duration = Duration::from_secs(10);

/// Route provider backed by an external directions service
#[derive(Debug, Clone)]
pub struct DirectionsProvider {
    access_token: Option<String>,
    base_url: String,
    profile: String,
    timeout: Duration,
}

impl DirectionsProvider {
    #[must_use]
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            access_token,
            base_url: MAPBOX_DIRECTIONS_URL.to_string(),
            profile: DEFAULT_PROFILE.to_string(),
            timeout: DEFAULT_DIRECTIONS_TIMEOUT,
        }
    }

    /// Provider configured from the `[directions]` settings
    #[must_use]
    pub fn from_config(config: &DirectionsConfig) -> Self {
        Self {
            access_token: config.access_token.clone(),
            base_url: config.base_url.clone(),
            profile: config.profile.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a usable access token is present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.token().is_some()
    }

    fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Walking path from origin to destination, or `None` when the provider is
    /// not configured or the request fails for any reason
    #[instrument(name = "directions_route", level = "debug", skip(self))]
    pub async fn route(
        &self,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
    ) -> Option<RoutePath> {
        let Some(token) = self.token() else {
            debug!("No directions access token configured, skipping request");
            return None;
        };

        match self
            .request(token, origin_lat, origin_lon, dest_lat, dest_lon)
            .await
        {
            Ok(path) => {
                debug!("Directions API returned {} points", path.len());
                Some(path)
            }
            Err(e) => {
                warn!("Directions routing error: {:#}", e);
                None
            }
        }
    }

    async fn request(
        &self,
        token: &str,
        origin_lat: f64,
        origin_lon: f64,
        dest_lat: f64,
        dest_lon: f64,
    ) -> Result<RoutePath> {
        let endpoint = format!(
            "{}/{}/{},{};{},{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.profile),
            origin_lon,
            origin_lat,
            dest_lon,
            dest_lat
        );
        debug!("Calling the directions API: {}", endpoint);

        let url = format!(
            "{endpoint}?geometries=geojson&access_token={}",
            urlencoding::encode(token)
        );

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        // reqwest errors carry the request URL, which holds the token
        let response = client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Directions request failed")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("Directions API returned an error status")?;

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to parse directions response")?;

        extract_path(body)
    }
}

/// First route's geometry converted from `[lon, lat]` to `(lat, lon)`
fn extract_path(response: DirectionsResponse) -> Result<RoutePath> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No routes in response"))?;

    let coordinates = route
        .geometry
        .coordinates
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(anyhow!("Malformed coordinate {:?}", position)),
        })
        .collect::<Result<Vec<[f64; 2]>>>()?;

    ensure!(!coordinates.is_empty(), "Route geometry has no coordinates");
    Ok(RoutePath::from_lon_lat(&coordinates))
}

#[derive(Debug, Deserialize)]
struct GeometryResponse {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    geometry: GeometryResponse,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    routes: Vec<RouteResponse>,
}
