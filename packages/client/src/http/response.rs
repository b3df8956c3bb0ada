//! Parsed HTTP/1.x responses

use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_LENGTH};
use http::{HeaderMap, StatusCode, Version};

/// A complete response, matched to exactly one request of the batch.
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    pub status: StatusCode,
    /// Reason phrase as sent by the server (may be empty)
    pub reason: String,
    pub version: Version,
    pub headers: HeaderMap,
    /// Body octets; always empty for responses to HEAD
    pub body: Bytes,
}

impl PipelineResponse {
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Declared `Content-Length`. For HEAD this describes the entity, not
    /// the (empty) body.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    }

    /// Whether the server will keep the connection open after this response.
    ///
    /// HTTP/1.1 is persistent unless `Connection: close`; HTTP/1.0 only with
    /// an explicit `Connection: keep-alive`.
    #[must_use]
    pub fn keeps_alive(&self) -> bool {
        let has_token = |token: &str| {
            self.headers.get_all(CONNECTION).iter().any(|value| {
                value
                    .to_str()
                    .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
                    .unwrap_or(false)
            })
        };
        match self.version {
            Version::HTTP_10 => has_token("keep-alive"),
            _ => !has_token("close"),
        }
    }
}
