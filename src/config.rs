//! Configuration management for `SafeRoute`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::SafeRouteError;
use crate::models::RiskLevel;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable read when no directions token is configured
pub const MAPBOX_TOKEN_ENV: &str = "MAPBOX_TOKEN";

/// Root configuration structure for `SafeRoute`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeRouteConfig {
    /// Risk dataset source and caching
    pub dataset: DatasetConfig,
    /// Offline street-graph routing
    pub routing: RoutingConfig,
    /// Directions API routing
    pub directions: DirectionsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Default query settings
    pub defaults: DefaultsConfig,
}

/// Risk dataset settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path of the CSV risk dataset
    pub path: Option<PathBuf>,
    /// Seconds before a cached dataset is reloaded; unset keeps it for the process lifetime
    pub cache_ttl_seconds: Option<u64>,
    /// Reload when the file's modification time changes
    pub reload_on_change: bool,
}

/// Offline street-graph settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Radius around the origin covered by the street graph, in metres
    #[serde(default = "default_radius_m")]
    pub radius_m: u32,
    /// Overpass request timeout in seconds
    #[serde(default = "default_graph_timeout")]
    pub graph_timeout_seconds: u64,
    /// Overpass API endpoint
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    /// Pre-downloaded Overpass JSON used instead of the API
    #[serde(default)]
    pub graph_file: Option<PathBuf>,
}

/// Directions API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionsConfig {
    /// Directions API base URL
    #[serde(default = "default_directions_base_url")]
    pub base_url: String,
    /// Routing profile
    #[serde(default = "default_directions_profile")]
    pub profile: String,
    /// API access token; routing through the API is disabled without one
    #[serde(default)]
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_directions_timeout")]
    pub timeout_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directives such as "saferoute=debug,reqwest=warn"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default query settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Number of safe locations returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Risk levels counted as safe
    #[serde(default = "default_safe_levels")]
    pub safe_levels: Vec<RiskLevel>,
}

// Default value functions
fn default_radius_m() -> u32 {
    3000
}

fn default_graph_timeout() -> u64 {
    60
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_directions_base_url() -> String {
    "https://api.mapbox.com/directions/v5/mapbox".to_string()
}

fn default_directions_profile() -> String {
    "walking".to_string()
}

fn default_directions_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_top_n() -> usize {
    3
}

fn default_safe_levels() -> Vec<RiskLevel> {
    RiskLevel::SAFE_DEFAULT.to_vec()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            radius_m: default_radius_m(),
            graph_timeout_seconds: default_graph_timeout(),
            overpass_url: default_overpass_url(),
            graph_file: None,
        }
    }
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: default_directions_base_url(),
            profile: default_directions_profile(),
            access_token: None,
            timeout_seconds: default_directions_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            safe_levels: default_safe_levels(),
        }
    }
}

impl SafeRouteConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SAFEROUTE_DIRECTIONS__ACCESS_TOKEN -> directions.access_token
        builder = builder.add_source(
            Environment::with_prefix("SAFEROUTE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("defaults.safe_levels")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: SafeRouteConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        config.apply_token_fallback(std::env::var(MAPBOX_TOKEN_ENV).ok());
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("saferoute").join("config.toml"))
    }

    /// Use `env_token` when no directions token is configured
    pub fn apply_token_fallback(&mut self, env_token: Option<String>) {
        let configured = self
            .directions
            .access_token
            .as_deref()
            .is_some_and(|token| !token.trim().is_empty());
        if !configured {
            self.directions.access_token = env_token.filter(|token| !token.trim().is_empty());
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.routing.radius_m == 0 {
            self.routing.radius_m = default_radius_m();
        }
        if self.routing.graph_timeout_seconds == 0 {
            self.routing.graph_timeout_seconds = default_graph_timeout();
        }
        if self.routing.overpass_url.is_empty() {
            self.routing.overpass_url = default_overpass_url();
        }
        if self.directions.base_url.is_empty() {
            self.directions.base_url = default_directions_base_url();
        }
        if self.directions.profile.is_empty() {
            self.directions.profile = default_directions_profile();
        }
        if self.directions.timeout_seconds == 0 {
            self.directions.timeout_seconds = default_directions_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.top_n == 0 {
            self.defaults.top_n = default_top_n();
        }
        if self.defaults.safe_levels.is_empty() {
            self.defaults.safe_levels = default_safe_levels();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.routing.radius_m > 50_000 {
            return Err(SafeRouteError::config("Street graph radius cannot exceed 50000 m").into());
        }

        if self.routing.graph_timeout_seconds > 600 {
            return Err(
                SafeRouteError::config("Street graph timeout cannot exceed 600 seconds").into(),
            );
        }

        if self.directions.timeout_seconds > 300 {
            return Err(
                SafeRouteError::config("Directions API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.dataset.cache_ttl_seconds == Some(0) {
            return Err(SafeRouteError::config(
                "Dataset cache TTL must be positive; remove it to cache for the process lifetime",
            )
            .into());
        }

        if self.defaults.top_n > 100 {
            return Err(SafeRouteError::config("Default top_n cannot exceed 100").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        // accepts a bare level or a full filter such as "saferoute=debug,reqwest=warn"
        crate::logging::build_filter(&self.logging.level)?;

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(SafeRouteError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Directions API base URL", &self.directions.base_url),
            ("Overpass API URL", &self.routing.overpass_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    SafeRouteError::config(format!("{name} must be a valid HTTP or HTTPS URL"))
                        .into(),
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SafeRouteConfig::default();
        assert_eq!(config.routing.radius_m, 3000);
        assert_eq!(config.routing.graph_timeout_seconds, 60);
        assert_eq!(
            config.directions.base_url,
            "https://api.mapbox.com/directions/v5/mapbox"
        );
        assert_eq!(config.directions.profile, "walking");
        assert_eq!(config.directions.timeout_seconds, 10);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.top_n, 3);
        assert_eq!(
            config.defaults.safe_levels,
            [RiskLevel::VeryLow, RiskLevel::Low]
        );
        assert!(config.directions.access_token.is_none());
        assert!(config.dataset.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = SafeRouteConfig::default();
        config.logging.level = "saferoute=loud".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[rstest]
    #[case("warn")]
    #[case("saferoute=debug")]
    #[case("saferoute=trace,reqwest=warn")]
    fn test_config_validation_accepts_filter_directives(#[case] level: &str) {
        let mut config = SafeRouteConfig::default();
        config.logging.level = level.to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = SafeRouteConfig::default();
        config.directions.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = SafeRouteConfig::default();
        config.dataset.cache_ttl_seconds = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_non_http_url() {
        let mut config = SafeRouteConfig::default();
        config.routing.overpass_url = "ftp://example.org".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Overpass API URL"));
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = SafeRouteConfig::default();
        config.routing.radius_m = 0;
        config.defaults.top_n = 0;
        config.defaults.safe_levels.clear();
        config.logging.format = String::new();

        config.apply_defaults();

        assert_eq!(config.routing.radius_m, 3000);
        assert_eq!(config.defaults.top_n, 3);
        assert_eq!(config.defaults.safe_levels, RiskLevel::SAFE_DEFAULT);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_token_fallback() {
        let mut config = SafeRouteConfig::default();
        config.apply_token_fallback(Some("pk.from_env".to_string()));
        assert_eq!(config.directions.access_token.as_deref(), Some("pk.from_env"));

        let mut config = SafeRouteConfig::default();
        config.directions.access_token = Some("pk.from_file".to_string());
        config.apply_token_fallback(Some("pk.from_env".to_string()));
        assert_eq!(config.directions.access_token.as_deref(), Some("pk.from_file"));

        let mut config = SafeRouteConfig::default();
        config.directions.access_token = Some(String::new());
        config.apply_token_fallback(Some("  ".to_string()));
        assert!(config.directions.access_token.is_none());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[dataset]
path = "data/risk.csv"
cache_ttl_seconds = 600

[routing]
radius_m = 1500

[directions]
access_token = "pk.test"
profile = "cycling"

[defaults]
top_n = 5
safe_levels = ["Very Low", "Low", "Medium"]
"#
        )
        .unwrap();

        let config = SafeRouteConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("data/risk.csv")));
        assert_eq!(config.dataset.cache_ttl_seconds, Some(600));
        assert_eq!(config.routing.radius_m, 1500);
        assert_eq!(config.routing.graph_timeout_seconds, 60);
        assert_eq!(config.directions.access_token.as_deref(), Some("pk.test"));
        assert_eq!(config.directions.profile, "cycling");
        assert_eq!(config.defaults.top_n, 5);
        assert_eq!(
            config.defaults.safe_levels,
            [RiskLevel::VeryLow, RiskLevel::Low, RiskLevel::Medium]
        );
    }

    #[test]
    fn test_load_rejects_unknown_risk_level() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[defaults]\nsafe_levels = [\"Extreme\"]").unwrap();

        let result = SafeRouteConfig::load_from_path(Some(file.path().to_path_buf()));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        let path = SafeRouteConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("saferoute"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}
