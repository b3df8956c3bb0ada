//! Connect, read, write and batch deadline timeouts

use std::time::Duration;

use super::super::validation::{ConfigDefaults, ConfigResult, ConfigValidator, ConfigurationError};

/// Runtime timeout configuration
///
/// `read_timeout` is a progress timeout: it bounds the wait for the next
/// bytes while requests are pending, not the duration of a whole round.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Whole-batch deadline measured from the start of `run`
    pub batch_deadline: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: ConfigDefaults::CONNECT_TIMEOUT,
            read_timeout: ConfigDefaults::READ_TIMEOUT,
            write_timeout: ConfigDefaults::WRITE_TIMEOUT,
            batch_deadline: None,
        }
    }
}

impl TimeoutConfig {
    /// Create aggressive timeout configuration
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            batch_deadline: None,
        }
    }

    /// Validate timeout configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero or exceeds one hour, or if the
    /// batch deadline is zero.
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(self.connect_timeout, "connect_timeout")?;
        ConfigValidator::validate_timeout(self.read_timeout, "read_timeout")?;
        ConfigValidator::validate_timeout(self.write_timeout, "write_timeout")?;
        if let Some(deadline) = self.batch_deadline {
            if deadline.is_zero() {
                return Err(ConfigurationError::InvalidTimeout(
                    "batch_deadline cannot be zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}
