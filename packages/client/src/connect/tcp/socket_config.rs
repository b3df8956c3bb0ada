//! TCP socket configuration utilities

use tokio::net::TcpStream;

use crate::error::{self, Result};

/// Configure a freshly connected socket.
///
/// `TCP_NODELAY` matters for pipelining: the last request of a round is
/// usually a small write that Nagle would otherwise hold back.
///
/// # Errors
///
/// Returns a connect error if the socket option cannot be set.
pub fn configure_tcp_socket(stream: &TcpStream, nodelay: bool) -> Result<()> {
    if nodelay {
        stream
            .set_nodelay(true)
            .map_err(|e| error::connect(format!("Failed to set TCP_NODELAY: {e}")))?;
    }
    Ok(())
}
