//! Error types for Kolosal drift monitoring

use thiserror::Error;

/// Result type alias for Kolosal drift operations
pub type Result<T> = std::result::Result<T, KolosalError>;

/// Main error type for the drift monitoring engine
#[derive(Error, Debug)]
pub enum KolosalError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Baseline already exists: {0}")]
    BaselineExists(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Metrics publishing error: {0}")]
    PublishError(String),

    #[error("Drift detection cancelled after {completed} of {total} features")]
    Cancelled { completed: usize, total: usize },
}

impl KolosalError {
    /// Shorthand for an out-of-range configuration value
    pub(crate) fn invalid_parameter(name: &str, value: impl ToString, reason: &str) -> Self {
        KolosalError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True when the error was raised while validating configuration
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            KolosalError::ConfigError(_) | KolosalError::InvalidParameter { .. }
        )
    }
}

impl From<polars::error::PolarsError> for KolosalError {
    fn from(err: polars::error::PolarsError) -> Self {
        KolosalError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for KolosalError {
    fn from(err: serde_json::Error) -> Self {
        KolosalError::SerializationError(err.to_string())
    }
}
