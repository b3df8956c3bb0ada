//! Batch input: one method and header set shared by many targets
//!
//! `BatchSpec` is built once and turned into an ordered list of
//! `PipelineRequest`s, each stamped with its position in the batch. Signed
//! requests (per-object signatures and the like) go through
//! `RequestOverride`, which layers request-specific headers over the shared
//! set.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, Method};
use ::url::Url;

use super::url::{Endpoint, origin_form, validate_target};
use crate::error::{self, Result};

/// One request of a batch. Immutable once created.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    index: usize,
    method: Method,
    target: String,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl PipelineRequest {
    /// Position in the batch; also the key of this request's outcome.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Headers in the order they are written.
    #[must_use]
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Responses to HEAD never carry body octets, whatever their headers say.
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// First value of `name`, if present.
    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }
}

/// Per-request deviations from the shared batch settings.
#[derive(Debug, Clone)]
pub struct RequestOverride {
    target: String,
    method: Option<Method>,
    headers: Vec<(HeaderName, HeaderValue)>,
    body: Bytes,
}

impl RequestOverride {
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            method: None,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Add a header; it replaces any shared header of the same name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// Ordered batch of requests against one origin.
///
/// # Examples
/// ```
/// use hpipe_client::http::BatchSpec;
/// use http::{HeaderName, HeaderValue};
///
/// let spec = BatchSpec::head()
///     .header(HeaderName::from_static("x-amz-date"), HeaderValue::from_static("20240101T000000Z"))
///     .targets(["/bucket/a.jpg", "/bucket/b.jpg"]);
/// assert_eq!(spec.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct BatchSpec {
    method: Method,
    headers: Vec<(HeaderName, HeaderValue)>,
    entries: Vec<RequestOverride>,
}

impl BatchSpec {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: Vec::new(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn head() -> Self {
        Self::new(Method::HEAD)
    }

    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// Build a batch from absolute URLs that share one origin.
    ///
    /// Returns the origin alongside the batch; targets are stored in origin
    /// form.
    ///
    /// # Errors
    ///
    /// Returns a builder error for an empty list, an unparsable URL, or URLs
    /// pointing at different origins.
    pub fn from_urls<I, S>(method: Method, urls: I) -> Result<(Endpoint, Self)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(method).with_urls(urls)
    }

    /// Append requests for absolute URLs that share one origin.
    ///
    /// # Errors
    ///
    /// As for [`from_urls`](Self::from_urls).
    pub fn with_urls<I, S>(mut self, urls: I) -> Result<(Endpoint, Self)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut endpoint: Option<Endpoint> = None;

        for raw in urls {
            let raw = raw.as_ref();
            let url = Url::parse(raw).map_err(|e| error::builder(e).with_target(raw))?;
            let origin = Endpoint::from_url(&url)?;
            match &endpoint {
                Some(first) if *first != origin => {
                    return Err(error::builder(format!(
                        "URL origin {}:{} differs from batch origin {}:{}",
                        origin.host, origin.port, first.host, first.port
                    ))
                    .with_target(raw));
                }
                Some(_) => {}
                None => endpoint = Some(origin),
            }
            self.entries.push(RequestOverride::new(origin_form(&url)));
        }

        let endpoint = endpoint.ok_or_else(|| error::builder("URL list is empty"))?;
        Ok((endpoint, self))
    }

    /// Add a header shared by every request in the batch.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Add a shared header from strings.
    ///
    /// # Errors
    ///
    /// Returns a builder error for an invalid header name or value.
    pub fn try_header(self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        Ok(self.header(name, value))
    }

    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.entries.push(RequestOverride::new(target));
        self
    }

    #[must_use]
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .extend(targets.into_iter().map(RequestOverride::new));
        self
    }

    /// Add a request with its own headers, method or body.
    #[must_use]
    pub fn request(mut self, request: RequestOverride) -> Self {
        self.entries.push(request);
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stamp each entry with its batch position and merge headers.
    ///
    /// # Errors
    ///
    /// Returns a builder error for an empty batch or a target that would
    /// break request-line framing.
    pub fn into_requests(self) -> Result<Vec<PipelineRequest>> {
        if self.entries.is_empty() {
            return Err(error::builder("batch contains no requests"));
        }

        let shared = self.headers;
        self.entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                validate_target(&entry.target)?;
                let mut headers: Vec<(HeaderName, HeaderValue)> = shared
                    .iter()
                    .filter(|(name, _)| !entry.headers.iter().any(|(own, _)| own == name))
                    .cloned()
                    .collect();
                headers.extend(entry.headers);
                Ok(PipelineRequest {
                    index,
                    method: entry.method.unwrap_or_else(|| self.method.clone()),
                    target: entry.target,
                    headers,
                    body: entry.body,
                })
            })
            .collect()
    }
}
