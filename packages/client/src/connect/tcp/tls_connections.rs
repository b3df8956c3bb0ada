//! TLS connection establishment over rustls

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::error::{self, Result};

/// Run the TLS handshake on an established TCP stream.
///
/// # Errors
///
/// Returns a connect error for an invalid server name or a failed handshake.
pub async fn establish_rustls_connection(
    stream: TcpStream,
    host: &str,
    config: Arc<rustls::ClientConfig>,
) -> Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| error::connect(format!("Invalid server name {host}: {e}")))?;

    TlsConnector::from(config)
        .connect(server_name, stream)
        .await
        .map_err(|e| error::connect(format!("TLS handshake with {host} failed: {e}")))
}
