use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A Result alias where the Err case is `hpipe_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while running a pipelined batch.
///
/// Cloning is cheap and keeps the source chain: one desync fans the same
/// error out to every request still waiting on the connection.
#[derive(Clone)]
pub struct Error {
    pub inner: Box<Inner>,
}

#[derive(Clone)]
pub struct Inner {
    pub kind: Kind,
    pub source: Option<Arc<dyn StdError + Send + Sync>>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Invalid batch input (empty batch, mixed origins, bad header)
    Builder,
    /// Invalid configuration
    Config,
    /// DNS resolution, TCP connect or TLS handshake failure
    Connect,
    /// Writing a request onto the connection failed
    Write,
    /// Malformed or desynchronized response framing
    Parse,
    /// Connection closed while requests were still pending
    PrematureClose,
    /// No progress within the read, write or connect timeout
    Timeout,
    /// Caller deadline expired before the request was resolved
    Canceled,
    /// Response body exceeds the configured ceiling
    PayloadTooLarge,
}

impl Kind {
    /// Stable lowercase name, used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Builder => "builder",
            Kind::Config => "config",
            Kind::Connect => "connect",
            Kind::Write => "write",
            Kind::Parse => "parse",
            Kind::PrematureClose => "premature_close",
            Kind::Timeout => "timeout",
            Kind::Canceled => "canceled",
            Kind::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                target: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(Arc::from(source.into()));
        self
    }

    /// Attach the request target the error belongs to.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.inner.target = Some(target.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Get the request target associated with this error, if any
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.inner.target.as_deref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("hpipe_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref target) = self.inner.target {
            f.field("target", target);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Builder => f.write_str("invalid batch")?,
            Kind::Config => f.write_str("invalid configuration")?,
            Kind::Connect => f.write_str("connection error")?,
            Kind::Write => f.write_str("error writing request")?,
            Kind::Parse => f.write_str("malformed or desynchronized response")?,
            Kind::PrematureClose => f.write_str("connection closed with requests pending")?,
            Kind::Timeout => f.write_str("operation timed out")?,
            Kind::Canceled => f.write_str("batch deadline expired")?,
            Kind::PayloadTooLarge => f.write_str("response body too large")?,
        }
        if let Some(ref source) = self.inner.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
