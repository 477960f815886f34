use thiserror::Error;

/// Failures of the offline street-graph route provider
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Street graph request timed out after {0} seconds")]
    Timeout(u64),

    /// No walkable street data within the configured radius
    #[error("No street graph could be built within {radius_m} m of the origin")]
    EmptyGraph { radius_m: u32 },

    #[error("No path exists between the snapped origin and destination")]
    NoPath,
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RoutingError::Parse(err.to_string())
        } else {
            RoutingError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
