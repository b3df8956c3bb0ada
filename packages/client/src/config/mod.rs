//! Pipelining session configuration
//!
//! One `PipelineConfig` describes one endpoint and how aggressively to
//! pipeline, retry and time out against it. Presets live in `client.rs`,
//! validation in `validation.rs`.

use std::time::Duration;

pub mod client;
pub mod timeouts;
pub mod validation;

pub use timeouts::TimeoutConfig;
pub use validation::{ConfigDefaults, ConfigResult, ConfigValidator, ConfigurationError, Validator};

use crate::http::url::Endpoint;
use crate::retry::RetryPolicy;

/// Configuration for a single pipelining session against one `host:port`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Remote host name or IP literal
    pub host: String,
    /// Remote port
    pub port: u16,
    /// Wrap the TCP stream in rustls
    pub use_tls: bool,
    /// Maximum number of requests written per round before reading ends
    pub max_pipeline_depth: usize,
    /// Attempt limits and backoff
    pub retry: RetryPolicy,
    /// Connect, read, write and whole-batch timeouts
    pub timeouts: TimeoutConfig,
    /// Keep the connection open between rounds; when false the last request
    /// of each round carries `Connection: close`
    pub keep_alive: bool,
    /// Bytes requested from the socket per read
    pub read_buffer_size: usize,
    /// Maximum header lines parsed per response
    pub max_headers: usize,
    /// Maximum size of a response status line plus headers
    pub max_head_size: usize,
    /// Maximum response body size
    pub max_body_size: usize,
    /// Set `TCP_NODELAY` on new connections
    pub tcp_nodelay: bool,
    /// Optional `User-Agent` added to requests that do not set one
    pub user_agent: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: ConfigDefaults::HTTP_PORT,
            use_tls: false,
            max_pipeline_depth: ConfigDefaults::MAX_PIPELINE_DEPTH,
            retry: RetryPolicy::default(),
            timeouts: TimeoutConfig::default(),
            keep_alive: true,
            read_buffer_size: ConfigDefaults::READ_BUFFER_SIZE,
            max_headers: ConfigDefaults::MAX_HEADERS,
            max_head_size: ConfigDefaults::MAX_HEAD_SIZE,
            max_body_size: ConfigDefaults::MAX_BODY_SIZE,
            tcp_nodelay: true,
            user_agent: None,
        }
    }
}

impl PipelineConfig {
    /// Plain-text configuration for `host:80`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Configuration derived from a URL origin.
    #[must_use]
    pub fn for_endpoint(endpoint: &Endpoint) -> Self {
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            use_tls: endpoint.use_tls,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable TLS. Switching on TLS while still on port 80 moves to 443.
    #[must_use]
    pub fn with_tls(mut self, use_tls: bool) -> Self {
        if use_tls && self.port == ConfigDefaults::HTTP_PORT {
            self.port = ConfigDefaults::HTTPS_PORT;
        }
        self.use_tls = use_tls;
        self
    }

    #[must_use]
    pub fn with_max_pipeline_depth(mut self, depth: usize) -> Self {
        self.max_pipeline_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.retry.backoff_base = base;
        if self.retry.max_backoff < base {
            self.retry.max_backoff = base;
        }
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.write_timeout = timeout;
        self
    }

    /// Abort the whole batch once this much time has passed.
    #[must_use]
    pub fn with_batch_deadline(mut self, deadline: Duration) -> Self {
        self.timeouts.batch_deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    #[must_use]
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// `host` or `host:port` as it should appear in the `Host` header.
    #[must_use]
    pub fn authority(&self) -> String {
        let default_port = if self.use_tls {
            ConfigDefaults::HTTPS_PORT
        } else {
            ConfigDefaults::HTTP_PORT
        };
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if self.port == default_port {
            host
        } else {
            format!("{host}:{}", self.port)
        }
    }
}

impl Validator for PipelineConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::InvalidAddress(
                "host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigurationError::InvalidAddress(
                "port cannot be zero".to_string(),
            ));
        }
        ConfigValidator::validate_range(
            self.max_pipeline_depth,
            1,
            ConfigDefaults::MAX_PIPELINE_DEPTH_LIMIT,
            "max_pipeline_depth",
        )?;
        ConfigValidator::validate_buffer_size(self.read_buffer_size, "read_buffer_size")?;
        ConfigValidator::validate_buffer_size(self.max_head_size, "max_head_size")?;
        ConfigValidator::validate_buffer_size(self.max_body_size, "max_body_size")?;
        if self.max_headers == 0 {
            return Err(ConfigurationError::InvalidParameter(
                "max_headers must be at least 1".to_string(),
            ));
        }
        self.timeouts.validate()?;
        self.retry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::new("example.com");
        assert_eq!(config.port, 80);
        assert!(!config.use_tls);
        assert_eq!(config.max_pipeline_depth, 1000);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.keep_alive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn enabling_tls_moves_default_port() {
        let config = PipelineConfig::new("example.com").with_tls(true);
        assert_eq!(config.port, 443);

        let custom = PipelineConfig::new("example.com").with_port(8443).with_tls(true);
        assert_eq!(custom.port, 8443);
    }

    #[test]
    fn authority_omits_default_port() {
        assert_eq!(PipelineConfig::new("example.com").authority(), "example.com");
        assert_eq!(
            PipelineConfig::new("example.com").with_port(9000).authority(),
            "example.com:9000"
        );
        assert_eq!(
            PipelineConfig::new("::1").with_port(8080).authority(),
            "[::1]:8080"
        );
    }

    #[test]
    fn rejects_zero_depth_and_attempts() {
        let config = PipelineConfig::new("example.com").with_max_pipeline_depth(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidParameter(_))
        ));

        let config = PipelineConfig::new("example.com").with_max_attempts(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_host_and_zero_port() {
        assert!(PipelineConfig::new("  ").validate().is_err());
        assert!(PipelineConfig::new("example.com").with_port(0).validate().is_err());
    }

    #[test]
    fn rejects_zero_read_timeout() {
        let config = PipelineConfig::new("example.com").with_read_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidTimeout(_))
        ));
    }
}
