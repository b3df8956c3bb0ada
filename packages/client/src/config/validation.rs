//! Configuration validation utilities

use std::time::Duration;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid network address: {0}")]
    InvalidAddress(String),

    #[error("Invalid buffer size: {0}")]
    InvalidBufferSize(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration conflict: {0}")]
    Conflict(String),
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` variant describing the first invalid setting.
    fn validate(&self) -> ConfigResult<()>;
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate timeout duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if the timeout is zero or
    /// exceeds one hour.
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

    /// Validate buffer size
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidBufferSize` if the size is zero or
    /// exceeds 1GB.
    pub fn validate_buffer_size(size: usize, name: &str) -> ConfigResult<()> {
        if size == 0 {
            return Err(ConfigurationError::InvalidBufferSize(format!(
                "{name} cannot be zero"
            )));
        }

        if size > 1024 * 1024 * 1024 {
            return Err(ConfigurationError::InvalidBufferSize(format!(
                "{name} cannot exceed 1GB"
            )));
        }

        Ok(())
    }

    /// Validate an integer parameter against an inclusive range
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` if `value` falls outside
    /// `min..=max`.
    pub fn validate_range(value: usize, min: usize, max: usize, name: &str) -> ConfigResult<()> {
        if value < min || value > max {
            return Err(ConfigurationError::InvalidParameter(format!(
                "{name} must be between {min} and {max}, got {value}"
            )));
        }
        Ok(())
    }
}

/// Default values shared by the presets
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const HTTP_PORT: u16 = 80;
    pub const HTTPS_PORT: u16 = 443;
    pub const MAX_PIPELINE_DEPTH: usize = 1000;
    pub const MAX_PIPELINE_DEPTH_LIMIT: usize = 100_000;
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const READ_TIMEOUT: Duration = Duration::from_secs(30);
    pub const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
    pub const BACKOFF_BASE: Duration = Duration::from_millis(100);
    pub const MAX_BACKOFF: Duration = Duration::from_secs(30);
    pub const READ_BUFFER_SIZE: usize = 1024 * 1024;
    pub const MAX_HEADERS: usize = 128;
    pub const MAX_HEAD_SIZE: usize = 64 * 1024;
    pub const MAX_BODY_SIZE: usize = 64 * 1024 * 1024;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_bounds() {
        assert!(ConfigValidator::validate_timeout(Duration::from_secs(1), "t").is_ok());
        assert!(ConfigValidator::validate_timeout(Duration::ZERO, "t").is_err());
        assert!(ConfigValidator::validate_timeout(Duration::from_secs(3601), "t").is_err());
    }

    #[test]
    fn range_message_names_the_parameter() {
        let err = ConfigValidator::validate_range(0, 1, 10, "max_pipeline_depth").unwrap_err();
        assert!(err.to_string().contains("max_pipeline_depth"));
    }
}
