//! Core `Pipeline` builder structure and endpoint selection

use http::Method;
use hpipe_client::{BatchSpec, Error, PipelineConfig};

/// Fluent builder for one pipelined batch.
///
/// Misuse (a bad header string, mixed-origin URLs) is remembered and
/// reported by [`send`](Pipeline::send), so chains never need `?` midway.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) batch: BatchSpec,
    pub(crate) deadline: Option<std::time::Duration>,
    pub(crate) error: Option<Error>,
    pub(crate) debug_enabled: bool,
}

impl Pipeline {
    /// Start a batch using `method` for every request.
    #[must_use]
    pub fn method(method: Method) -> Self {
        Self {
            config: PipelineConfig::default(),
            batch: BatchSpec::new(method),
            deadline: None,
            error: None,
            debug_enabled: false,
        }
    }

    /// Start a batch of `HEAD` requests.
    #[must_use]
    pub fn head() -> Self {
        Self::method(Method::HEAD)
    }

    /// Start a batch of `GET` requests.
    #[must_use]
    pub fn get() -> Self {
        Self::method(Method::GET)
    }

    /// Host to connect to (name or IP literal).
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Port to connect to.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Use TLS. Moves the port from 80 to 443 unless one was set.
    #[must_use]
    pub fn tls(mut self, use_tls: bool) -> Self {
        self.config = self.config.with_tls(use_tls);
        self
    }

    /// Add requests for absolute URLs; their shared origin becomes the
    /// endpoint (scheme, host and port).
    #[must_use]
    pub fn urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let batch = std::mem::replace(&mut self.batch, BatchSpec::new(Method::GET));
        let method = batch.method().clone();
        match batch.with_urls(urls) {
            Ok((endpoint, batch)) => {
                self.batch = batch;
                self.config.host = endpoint.host;
                self.config.port = endpoint.port;
                self.config.use_tls = endpoint.use_tls;
            }
            Err(err) => {
                self.batch = BatchSpec::new(method);
                self.fail(err);
            }
        }
        self
    }

    /// Replace the whole session configuration.
    ///
    /// Endpoint settings already chosen on this builder are overwritten too.
    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Log the batch shape and outcome counts at `debug` level.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug_enabled = true;
        self
    }

    /// Keep the first builder error; later ones are usually consequences.
    pub(crate) fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
