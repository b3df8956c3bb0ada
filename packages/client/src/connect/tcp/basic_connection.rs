//! Basic TCP connection establishment
//!
//! Tries each resolved address in turn, each bounded by the connect timeout.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::{self, Result, TimedOut};

/// Connect to the first reachable address.
///
/// # Errors
///
/// Returns a connect error carrying the last failure when every address
/// fails or times out.
pub async fn connect_to_address_list(addrs: &[SocketAddr], timeout: Duration) -> Result<TcpStream> {
    if addrs.is_empty() {
        return Err(error::connect("No addresses to connect to"));
    }

    let mut last_error = None;
    for addr in addrs {
        match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => {
                tracing::debug!(%addr, error = %e, "TCP connect failed");
                last_error = Some(error::connect(e));
            }
            Err(_) => {
                tracing::debug!(%addr, ?timeout, "TCP connect timed out");
                last_error = Some(error::connect(TimedOut));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        error::connect(io::Error::new(
            io::ErrorKind::NotConnected,
            "Failed to connect to any address",
        ))
    }))
}
