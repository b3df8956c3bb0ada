//! Retry policy configuration with exponential backoff and jitter
//!
//! Decides how many times a request may be attempted, how long to wait
//! before resubmitting it, and which response statuses count as failures.

use std::time::Duration;

use fastrand::Rng;

use crate::config::{ConfigDefaults, ConfigResult, ConfigurationError};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts per request, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry
    pub backoff_base: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
    /// Jitter factor (0.0 to 1.0) to prevent thundering herd
    pub jitter_factor: f64,
    /// Response statuses resubmitted while attempts remain
    pub retry_on_status: Vec<u16>,
    /// Consecutive failed connection attempts after which the whole batch is
    /// failed instead of retrying each request against a dead endpoint
    pub max_consecutive_connect_failures: u32,
}

impl Default for RetryPolicy {
    /// Create default retry policy with balanced configuration
    fn default() -> Self {
        Self {
            max_attempts: ConfigDefaults::MAX_ATTEMPTS,
            backoff_base: ConfigDefaults::BACKOFF_BASE,
            max_backoff: ConfigDefaults::MAX_BACKOFF,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            retry_on_status: Vec::new(),
            max_consecutive_connect_failures: ConfigDefaults::MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Create aggressive retry policy for critical batches
    ///
    /// Uses faster retry cycles with more attempts.
    #[inline]
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(20),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 1.5,
            jitter_factor: 0.2,
            retry_on_status: Vec::new(),
            max_consecutive_connect_failures: 5,
        }
    }

    /// Create no-retry policy (single attempt only)
    #[inline]
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_base: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
            retry_on_status: Vec::new(),
            max_consecutive_connect_failures: 1,
        }
    }

    /// Retry responses carrying these statuses, e.g. `[500, 502, 503, 504]`.
    #[must_use]
    pub fn with_retry_on_status(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_on_status = statuses.into_iter().collect();
        self
    }

    /// Calculate the delay before the next attempt, given how many attempts
    /// have already been made
    ///
    /// `base * multiplier^(attempts - 1)`, capped at `max_backoff`, then
    /// spread by `jitter_factor`.
    #[inline]
    #[must_use]
    pub fn calculate_delay(&self, attempts_made: u32) -> Duration {
        if attempts_made == 0 || self.backoff_base.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempts_made - 1).unwrap_or(i32::MAX);
        let base_ms = self.backoff_base.as_secs_f64() * 1000.0;
        let max_ms = self.max_backoff.as_secs_f64() * 1000.0;
        let capped = (base_ms * self.backoff_multiplier.powi(exponent)).min(max_ms);

        let jitter_range = capped * self.jitter_factor;
        let mut rng = Rng::new();
        let jitter = rng.f64() * jitter_range - (jitter_range / 2.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let micros = ((capped + jitter).max(0.0) * 1000.0).round() as u64;
        Duration::from_micros(micros)
    }

    /// Whether a request that has made `attempts_made` attempts may go again.
    #[inline]
    #[must_use]
    pub fn has_attempts_left(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Whether a response status should be treated as a retryable failure.
    #[inline]
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Validate policy configuration for consistency
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` for out-of-range values
    /// and `ConfigurationError::Conflict` when the base delay exceeds the cap.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigurationError::InvalidParameter(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.max_consecutive_connect_failures == 0 {
            return Err(ConfigurationError::InvalidParameter(
                "max_consecutive_connect_failures must be at least 1".to_string(),
            ));
        }

        if !(self.backoff_multiplier >= 1.0) {
            return Err(ConfigurationError::InvalidParameter(
                "backoff_multiplier must be at least 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigurationError::InvalidParameter(
                "jitter_factor must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.backoff_base > self.max_backoff {
            return Err(ConfigurationError::Conflict(
                "backoff_base cannot exceed max_backoff".to_string(),
            ));
        }

        Ok(())
    }
}
