//! Connection establishment and ownership
//!
//! `tcp` holds the free functions (resolve, connect, socket options, TLS
//! handshake), `types` the stream and connector types, and `manager` the
//! single-connection lifecycle a pipelining session runs on.

pub mod manager;
pub mod tcp;
pub mod types;

pub use manager::{Connection, ConnectionManager};
pub use tcp::{
    configure_tcp_socket, connect_to_address_list, establish_rustls_connection, resolve_host,
};
pub use types::{Connector, MaybeTlsStream, TcpConnector};
