//! Centralized error types for Beaver.

use thiserror::Error;

/// Main error type for domain-level operations.
#[derive(Error, Debug)]
pub enum BeaverError {
    #[error("Unknown entity kind: {0}")]
    UnknownEntityKind(String),

    #[error("Invalid value '{value}' for {field}")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for domain-level operations.
pub type BeaverResult<T> = Result<T, BeaverError>;

impl BeaverError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn invalid_enum(field: &'static str, value: &str) -> Self {
        Self::InvalidEnumValue {
            field,
            value: value.to_string(),
        }
    }
}
