//! Shared and per-request headers

use http::{HeaderName, HeaderValue};
use hpipe_client::{Error, RequestOverride};

use crate::builder::core::Pipeline;

impl Pipeline {
    /// Add a header sent with every request of the batch.
    ///
    /// # Examples
    /// ```
    /// use hpipe::Pipeline;
    /// use http::{HeaderName, HeaderValue};
    ///
    /// let pipeline = Pipeline::head()
    ///     .host("bucket.example.com")
    ///     .header(
    ///         HeaderName::from_static("x-amz-request-payer"),
    ///         HeaderValue::from_static("requester"),
    ///     )
    ///     .target("/key");
    /// ```
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.batch = self.batch.header(name, value);
        self
    }

    /// Add a shared header from strings. An invalid name or value is
    /// reported by `send`.
    #[must_use]
    pub fn header_str(mut self, name: &str, value: &str) -> Self {
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .map_err(Error::from)
            .and_then(|name| {
                HeaderValue::from_str(value)
                    .map(|value| (name, value))
                    .map_err(Error::from)
            });
        match parsed {
            Ok((name, value)) => self.header(name, value),
            Err(err) => {
                self.fail(err.with_target(format!("header {name}")));
                self
            }
        }
    }

    /// `User-Agent` for requests that do not set one.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config = self.config.with_user_agent(user_agent);
        self
    }

    /// Add one request with its own headers on top of the shared ones.
    ///
    /// A header given here replaces a shared header of the same name, which
    /// is how per-object signatures are attached.
    #[must_use]
    pub fn request<I>(mut self, target: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = (HeaderName, HeaderValue)>,
    {
        let request = headers
            .into_iter()
            .fold(RequestOverride::new(target), |request, (name, value)| {
                request.header(name, value)
            });
        self.batch = self.batch.request(request);
        self
    }
}
