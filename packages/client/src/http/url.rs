//! URL helpers for URL-list batches
//!
//! A pipelined batch talks to exactly one origin, so every URL in a list
//! must agree on scheme, host and port.

use ::url::Url;

use crate::config::ConfigDefaults;
use crate::error::{self, Result};

/// The single origin a URL-list batch is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

impl Endpoint {
    /// Extract the origin of an absolute `http`/`https` URL.
    ///
    /// # Errors
    ///
    /// Returns a builder error for other schemes or URLs without a host.
    pub fn from_url(url: &Url) -> Result<Self> {
        let use_tls = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(error::builder(format!("unsupported URL scheme `{other}`"))
                    .with_target(url.as_str()));
            }
        };
        let host = match url.host() {
            Some(::url::Host::Ipv6(addr)) => addr.to_string(),
            Some(host) => host.to_string(),
            None => {
                return Err(error::builder("URL has no host").with_target(url.as_str()));
            }
        };
        let default_port = if use_tls {
            ConfigDefaults::HTTPS_PORT
        } else {
            ConfigDefaults::HTTP_PORT
        };
        Ok(Self {
            host,
            port: url.port().unwrap_or(default_port),
            use_tls,
        })
    }
}

/// The origin-form request target (`/path?query`) for an absolute URL.
#[must_use]
pub fn origin_form(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Request targets must not break request-line framing.
pub(crate) fn validate_target(target: &str) -> Result<()> {
    if target.is_empty() {
        return Err(error::builder("request target cannot be empty"));
    }
    if target.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(error::builder("request target contains whitespace or control bytes")
            .with_target(target));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_defaults_port_by_scheme() {
        let url = Url::parse("https://bucket.s3.amazonaws.com/key").unwrap();
        let endpoint = Endpoint::from_url(&url).unwrap();
        assert_eq!(endpoint.host, "bucket.s3.amazonaws.com");
        assert_eq!(endpoint.port, 443);
        assert!(endpoint.use_tls);

        let url = Url::parse("http://localhost:8080/a").unwrap();
        let endpoint = Endpoint::from_url(&url).unwrap();
        assert_eq!(endpoint.port, 8080);
        assert!(!endpoint.use_tls);
    }

    #[test]
    fn endpoint_rejects_other_schemes() {
        let url = Url::parse("ftp://example.com/file").unwrap();
        assert!(Endpoint::from_url(&url).unwrap_err().is_builder());
    }

    #[test]
    fn ipv6_host_is_unbracketed() {
        let url = Url::parse("http://[::1]:9000/").unwrap();
        assert_eq!(Endpoint::from_url(&url).unwrap().host, "::1");
    }

    #[test]
    fn origin_form_keeps_query() {
        let url = Url::parse("http://example.com/example-bt/example.jpg?versionId=3").unwrap();
        assert_eq!(origin_form(&url), "/example-bt/example.jpg?versionId=3");
        let url = Url::parse("http://example.com").unwrap();
        assert_eq!(origin_form(&url), "/");
    }

    #[test]
    fn targets_with_whitespace_are_rejected() {
        assert!(validate_target("/ok").is_ok());
        assert!(validate_target("http://example.com/absolute").is_ok());
        assert!(validate_target("").is_err());
        assert!(validate_target("/a b").is_err());
        assert!(validate_target("/a\r\nHost: evil").is_err());
    }
}
