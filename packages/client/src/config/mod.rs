//! Engine configuration
//!
//! Plain configuration values with sensible defaults. Nothing in here is
//! global; callers hand an `EngineConfig` to the operations that need it.

use std::time::Duration;

pub mod validation;

pub use validation::{ConfigValidator, ConfigurationError, Validator};

/// Default truncation limit for short value projections (e.g. raw bytes).
pub const FORMAT_LIMIT_SHORT: usize = 32;

/// Default truncation limit for long value projections (e.g. name lists).
pub const FORMAT_LIMIT_LONG: usize = 256;

/// Default bound for issuer walks.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// How password queries are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordMode {
    /// Never query; every password request yields "not available".
    None,
    /// Forward queries to the caller supplied callback.
    #[default]
    Callback,
}

/// Attribute projection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLimits {
    pub short: usize,
    pub long: usize,
}

impl Default for FormatLimits {
    fn default() -> Self {
        Self {
            short: FORMAT_LIMIT_SHORT,
            long: FORMAT_LIMIT_LONG,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub format_limits: FormatLimits,
    pub max_chain_depth: usize,
    pub password_mode: PasswordMode,
    pub ssl_connect_timeout: Duration,
    /// Overall timeout of an HTTP(S) resource fetch.
    pub url_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            format_limits: FormatLimits::default(),
            max_chain_depth: MAX_CHAIN_DEPTH,
            password_mode: PasswordMode::default(),
            ssl_connect_timeout: Duration::from_secs(10),
            url_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format_limits(mut self, short: usize, long: usize) -> Self {
        self.format_limits = FormatLimits { short, long };
        self
    }

    #[must_use]
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    #[must_use]
    pub fn with_password_mode(mut self, mode: PasswordMode) -> Self {
        self.password_mode = mode;
        self
    }

    #[must_use]
    pub fn with_ssl_connect_timeout(mut self, timeout: Duration) -> Self {
        self.ssl_connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_url_timeout(mut self, timeout: Duration) -> Self {
        self.url_timeout = timeout;
        self
    }
}

impl Validator for EngineConfig {
    fn validate(&self) -> validation::ConfigResult<()> {
        ConfigValidator::validate_limit(self.format_limits.short, "format_limits.short")?;
        ConfigValidator::validate_limit(self.format_limits.long, "format_limits.long")?;
        if self.format_limits.short > self.format_limits.long {
            return Err(ConfigurationError::Conflict(
                "format_limits.short exceeds format_limits.long".to_string(),
            ));
        }
        ConfigValidator::validate_limit(self.max_chain_depth, "max_chain_depth")?;
        ConfigValidator::validate_timeout(self.ssl_connect_timeout, "ssl_connect_timeout")?;
        ConfigValidator::validate_timeout(self.url_timeout, "url_timeout")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_chain_depth, MAX_CHAIN_DEPTH);
        assert_eq!(config.password_mode, PasswordMode::Callback);
    }

    #[test]
    fn test_conflicting_limits_rejected() {
        let config = EngineConfig::new().with_format_limits(300, 10);
        assert!(matches!(config.validate(), Err(ConfigurationError::Conflict(_))));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = EngineConfig::new().with_max_chain_depth(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter(_))
        ));
    }
}
