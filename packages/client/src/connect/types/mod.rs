//! Connector seam and transport stream types

pub mod connection;
pub mod connector;

pub use connection::MaybeTlsStream;
pub use connector::{Connector, TcpConnector};
