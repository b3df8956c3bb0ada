//! DNS resolution and address handling utilities
//!
//! IP literals skip the resolver entirely.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::error::{self, Result};

/// Resolve a hostname to socket addresses.
///
/// # Errors
///
/// Returns a connect error if resolution fails or yields no addresses.
pub async fn resolve_host(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    // Fast path for IP addresses
    if let Ok(ip) = IpAddr::from_str(host) {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| error::connect(format!("DNS resolution failed for {host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(error::connect(format!("No addresses resolved for {host}")));
    }
    Ok(addrs)
}
