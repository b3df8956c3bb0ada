//! Error types for pipelined batches
//!
//! Every transport failure is recorded per request in the batch result; only
//! caller misuse (`Kind::Builder`, `Kind::Config`) escapes `PipelineClient::run`.

pub mod classification;
pub mod constructors;
pub mod conversions;
pub mod helpers;
pub mod types;

pub use constructors::*;
pub use helpers::{ConnectionClosed, IncompleteMessage, OperationCanceled, TimedOut};
pub use types::{Error, Kind, Result};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;
