//! Connection establishment seam
//!
//! The connection manager only needs "give me a fresh byte stream to the
//! endpoint". `TcpConnector` does DNS, TCP and optional TLS; tests plug in
//! in-memory streams through the same trait.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use super::connection::MaybeTlsStream;
use crate::config::PipelineConfig;
use crate::connect::tcp::{
    configure_tcp_socket, connect_to_address_list, establish_rustls_connection, resolve_host,
};
use crate::error::{self, Result, TimedOut};

/// Opens new connections to one fixed endpoint.
pub trait Connector: Send + Sync {
    type Io: AsyncRead + AsyncWrite + Unpin + Send;

    /// Open a new connection, handshake included.
    fn connect(&self) -> impl Future<Output = Result<Self::Io>> + Send;

    /// Human-readable endpoint, used in logs.
    fn endpoint(&self) -> String;
}

impl<C: Connector> Connector for Arc<C> {
    type Io = C::Io;

    fn connect(&self) -> impl Future<Output = Result<Self::Io>> + Send {
        C::connect(self)
    }

    fn endpoint(&self) -> String {
        C::endpoint(self)
    }
}

/// DNS + TCP (+ rustls) connector.
#[derive(Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
    nodelay: bool,
    tls: Option<Arc<rustls::ClientConfig>>,
}

impl std::fmt::Debug for TcpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connect_timeout", &self.connect_timeout)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

impl TcpConnector {
    /// Connector for the endpoint in `config`, with webpki roots when TLS is on.
    ///
    /// # Errors
    ///
    /// Returns a connect error if the TLS client config cannot be built.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let tls = if config.use_tls {
            Some(crate::tls::default_client_config()?)
        } else {
            None
        };
        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            connect_timeout: config.timeouts.connect_timeout,
            nodelay: config.tcp_nodelay,
            tls,
        })
    }

    /// Use a caller-supplied rustls config (custom roots, client certs).
    #[must_use]
    pub fn with_tls_config(mut self, config: Arc<rustls::ClientConfig>) -> Self {
        self.tls = Some(config);
        self
    }

    async fn open(&self) -> Result<MaybeTlsStream> {
        let addrs = resolve_host(&self.host, self.port).await?;
        let stream = connect_to_address_list(&addrs, self.connect_timeout).await?;
        configure_tcp_socket(&stream, self.nodelay)?;

        match &self.tls {
            Some(config) => {
                let tls = establish_rustls_connection(stream, &self.host, Arc::clone(config)).await?;
                Ok(MaybeTlsStream::Tls(Box::new(tls)))
            }
            None => Ok(MaybeTlsStream::Plain(stream)),
        }
    }
}

impl Connector for TcpConnector {
    type Io = MaybeTlsStream;

    async fn connect(&self) -> Result<MaybeTlsStream> {
        // DNS and the TLS handshake share the connect budget with TCP.
        match tokio::time::timeout(self.connect_timeout, self.open()).await {
            Ok(result) => result,
            Err(_) => Err(error::connect(TimedOut)),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
