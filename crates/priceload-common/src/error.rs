//! Error types shared across the priceload workspace

use thiserror::Error;

/// Result type alias for priceload operations
pub type Result<T> = std::result::Result<T, PriceloadError>;

/// Main error type for priceload
#[derive(Error, Debug)]
pub enum PriceloadError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidSetting { key: String, value: String },
}

impl PriceloadError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an error for an environment setting that failed to parse
    pub fn invalid_setting(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            value: value.into(),
        }
    }
}
