//! Configuration validation utilities

use std::time::Duration;

use crate::error::CertError;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration conflict: {0}")]
    Conflict(String),
}

impl From<ConfigurationError> for CertError {
    fn from(e: ConfigurationError) -> Self {
        CertError::InvalidArgument(e.to_string())
    }
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` variant if any validation fails.
    fn validate(&self) -> ConfigResult<()>;
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate timeout duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if the duration is zero or
    /// exceeds 1 hour.
    pub fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot be zero"
            )));
        }
        if timeout.as_secs() > 3600 {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot exceed 1 hour"
            )));
        }
        Ok(())
    }

    /// Validate a positive count or length limit
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` if the limit is zero.
    pub fn validate_limit(limit: usize, name: &str) -> ConfigResult<()> {
        if limit == 0 {
            return Err(ConfigurationError::InvalidParameter(format!(
                "{name} must be greater than zero"
            )));
        }
        Ok(())
    }
}
