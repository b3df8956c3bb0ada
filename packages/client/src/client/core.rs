//! Core pipelining client

use std::sync::Arc;
use std::time::Instant;

use http::Method;

use crate::config::{PipelineConfig, Validator};
use crate::connect::{Connector, TcpConnector};
use crate::error::Result;
use crate::http::{BatchResult, BatchSpec};
use crate::retry::RetryCoordinator;

/// Runs batches of pipelined requests against one endpoint.
///
/// The connector is shared between batches; connections are not. Batches
/// run concurrently on clones of the same client never share a socket.
#[derive(Debug)]
pub struct PipelineClient<C: Connector = TcpConnector> {
    config: PipelineConfig,
    connector: Arc<C>,
}

impl<C: Connector> Clone for PipelineClient<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            connector: Arc::clone(&self.connector),
        }
    }
}

impl PipelineClient<TcpConnector> {
    /// Client for `config`'s endpoint over TCP, with rustls when
    /// `use_tls` is set.
    ///
    /// # Errors
    ///
    /// `Kind::Config` for an invalid configuration, `Kind::Connect` if the
    /// TLS client configuration cannot be built.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let connector = TcpConnector::from_config(&config)?;
        Ok(Self {
            config,
            connector: Arc::new(connector),
        })
    }
}

impl<C: Connector> PipelineClient<C> {
    /// Client that opens connections through `connector`.
    ///
    /// # Errors
    ///
    /// `Kind::Config` for an invalid configuration.
    pub fn with_connector(config: PipelineConfig, connector: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connector: Arc::new(connector),
        })
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Pipeline every request of `batch` and collect one outcome per request.
    ///
    /// Transport failures never fail the call; they end up in the
    /// per-request outcomes. A configured batch deadline applies.
    ///
    /// # Errors
    ///
    /// `Kind::Builder` for an empty batch or an invalid request target.
    pub async fn run(&self, batch: BatchSpec) -> Result<BatchResult> {
        let deadline = self
            .config
            .timeouts
            .batch_deadline
            .map(|budget| Instant::now() + budget);
        self.execute(batch, deadline).await
    }

    /// Like [`run`](Self::run), but give up at `deadline`.
    ///
    /// Requests still unresolved at the deadline fail with
    /// `Kind::Canceled`; responses matched before it are kept. The earlier
    /// of `deadline` and the configured batch deadline wins.
    ///
    /// # Errors
    ///
    /// `Kind::Builder` for an empty batch or an invalid request target.
    pub async fn run_until(&self, batch: BatchSpec, deadline: Instant) -> Result<BatchResult> {
        let configured = self
            .config
            .timeouts
            .batch_deadline
            .map(|budget| Instant::now() + budget);
        let deadline = match configured {
            Some(configured) => configured.min(deadline),
            None => deadline,
        };
        self.execute(batch, Some(deadline)).await
    }

    async fn execute(&self, batch: BatchSpec, deadline: Option<Instant>) -> Result<BatchResult> {
        let requests = batch.into_requests()?;
        let coordinator = RetryCoordinator::new(Arc::clone(&self.connector), &self.config);
        let deadline = deadline.map(tokio::time::Instant::from_std);
        Ok(coordinator.run(requests, deadline).await)
    }
}

/// One-shot helper: pipeline `method` to every URL in `urls`.
///
/// All URLs must share one origin; `https` URLs enable TLS. Settings other
/// than the endpoint come from `PipelineConfig::default()`.
///
/// # Errors
///
/// `Kind::Builder` for an empty or mixed-origin URL list, `Kind::Config` or
/// `Kind::Connect` as in [`PipelineClient::new`].
pub async fn run_urls<I, S>(method: Method, urls: I) -> Result<BatchResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (endpoint, batch) = BatchSpec::from_urls(method, urls)?;
    let client = PipelineClient::new(PipelineConfig::for_endpoint(&endpoint))?;
    client.run(batch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let err = PipelineClient::new(PipelineConfig::new("example.com").with_max_pipeline_depth(0))
            .unwrap_err();
        assert_eq!(err.kind(), Kind::Config);
    }

    #[tokio::test]
    async fn empty_batch_is_misuse() {
        let client = PipelineClient::new(PipelineConfig::new("127.0.0.1")).unwrap();
        let err = client.run(BatchSpec::head()).await.unwrap_err();
        assert!(err.is_builder());
    }

    #[tokio::test]
    async fn mixed_origins_are_misuse() {
        let err = run_urls(
            Method::HEAD,
            ["http://a.example/x", "http://b.example/y"],
        )
        .await
        .unwrap_err();
        assert!(err.is_builder());
    }
}
