//! Error types and handling for `SafeRoute`

use thiserror::Error;

use crate::routing::RoutingError;

/// Main error type for the `SafeRoute` library
#[derive(Error, Debug)]
pub enum SafeRouteError {
    /// The risk dataset is missing required fields or holds invalid values
    #[error("Data validation error: {message}")]
    DataValidation {
        message: String,
        missing_fields: Vec<String>,
    },

    /// A nearest-location query ran against a dataset with zero records
    #[error("Dataset contains no records")]
    EmptyDataset,

    /// Offline graph construction or shortest-path failure
    #[error("Routing error: {source}")]
    Routing {
        #[from]
        source: RoutingError,
    },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// CSV decoding errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl SafeRouteError {
    /// Create a validation error for fields that are absent from the source
    pub fn missing_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let missing_fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        Self::DataValidation {
            message: format!(
                "Missing required fields in risk data: {}",
                missing_fields.join(", ")
            ),
            missing_fields,
        }
    }

    /// Create a validation error for an invalid value
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::DataValidation {
            message: message.into(),
            missing_fields: Vec::new(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Names of the required fields that were missing, if any
    #[must_use]
    pub fn missing(&self) -> &[String] {
        match self {
            SafeRouteError::DataValidation { missing_fields, .. } => missing_fields,
            _ => &[],
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            SafeRouteError::DataValidation { message, .. } => {
                format!("The risk dataset is invalid: {message}")
            }
            SafeRouteError::EmptyDataset => {
                "No locations are available in the risk dataset.".to_string()
            }
            SafeRouteError::Routing { .. } => "Failed to generate route.".to_string(),
            SafeRouteError::Config { .. } => {
                "Configuration error. Please check your config file and access tokens."
                    .to_string()
            }
            SafeRouteError::Csv { .. } => {
                "The risk dataset could not be read as CSV.".to_string()
            }
            SafeRouteError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_names() {
        let err = SafeRouteError::missing_fields(["risk_level", "area"]);
        assert_eq!(err.missing(), ["risk_level", "area"]);
        assert!(err.to_string().contains("risk_level"));
        assert!(err.to_string().contains("area"));
    }

    #[test]
    fn test_user_messages() {
        let err = SafeRouteError::EmptyDataset;
        assert!(err.user_message().contains("No locations"));

        let err: SafeRouteError = RoutingError::EmptyGraph { radius_m: 3000 }.into();
        assert_eq!(err.user_message(), "Failed to generate route.");

        let err = SafeRouteError::validation("latitude out of range");
        assert!(err.user_message().contains("latitude out of range"));
        assert!(err.missing().is_empty());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SafeRouteError = io_err.into();
        assert!(matches!(err, SafeRouteError::Io { .. }));
    }
}
