//! TCP connection utilities
//!
//! DNS resolution, address-list connect, socket options and the rustls
//! handshake, composed by `TcpConnector`.

pub mod basic_connection;
pub mod dns_resolution;
pub mod socket_config;
pub mod tls_connections;

pub use basic_connection::connect_to_address_list;
pub use dns_resolution::resolve_host;
pub use socket_config::configure_tcp_socket;
pub use tls_connections::establish_rustls_connection;
