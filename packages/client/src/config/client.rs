//! Pipeline configuration presets
//!
//! Provides configurations tuned for common batch shapes: plain HTTP,
//! TLS, aggressive fail-fast runs and object-storage metadata sweeps.

use std::time::Duration;

use super::PipelineConfig;
use super::timeouts::TimeoutConfig;
use super::validation::ConfigDefaults;
use crate::retry::RetryPolicy;

impl PipelineConfig {
    /// TLS configuration for `host:443`.
    #[must_use]
    pub fn tls(host: impl Into<String>) -> Self {
        Self::new(host).with_tls(true)
    }

    /// Fail-fast preset
    ///
    /// Short timeouts with more, quicker attempts. Suited to interactive
    /// tools where a stuck connection should be abandoned early.
    ///
    /// # Examples
    /// ```
    /// use hpipe_client::config::PipelineConfig;
    ///
    /// let config = PipelineConfig::aggressive("example.com");
    /// assert_eq!(config.retry.max_attempts, 5);
    /// ```
    #[must_use]
    pub fn aggressive(host: impl Into<String>) -> Self {
        Self {
            timeouts: TimeoutConfig::aggressive(),
            retry: RetryPolicy::aggressive(),
            ..Self::new(host)
        }
    }

    /// Object-storage preset
    ///
    /// Thousands of HEAD/GET requests against one bucket endpoint: TLS,
    /// full pipeline depth and short backoff.
    ///
    /// # Examples
    /// ```
    /// use hpipe_client::config::PipelineConfig;
    ///
    /// let config = PipelineConfig::object_storage("bucket.s3.amazonaws.com");
    /// assert!(config.use_tls);
    /// assert_eq!(config.port, 443);
    /// assert_eq!(config.max_pipeline_depth, 1000);
    /// ```
    #[must_use]
    pub fn object_storage(host: impl Into<String>) -> Self {
        Self {
            max_pipeline_depth: ConfigDefaults::MAX_PIPELINE_DEPTH,
            retry: RetryPolicy {
                backoff_base: Duration::from_millis(50),
                max_backoff: Duration::from_secs(5),
                ..RetryPolicy::default()
            },
            timeouts: TimeoutConfig {
                read_timeout: Duration::from_secs(10),
                ..TimeoutConfig::default()
            },
            ..Self::tls(host)
        }
    }
}
