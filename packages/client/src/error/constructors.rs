use super::BoxError;
use super::helpers::{ConnectionClosed, IncompleteMessage, OperationCanceled, TimedOut};
use super::types::{Error, Kind};

/// Creates an `Error` for invalid batch input.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for an invalid configuration.
pub fn configuration<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Config).with(e.into())
}

/// Creates an `Error` for connection establishment failures.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates an `Error` for a failed request write.
pub fn write<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Write).with(e.into())
}

/// Creates an `Error` for malformed response framing.
pub fn parse<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Parse).with(e.into())
}

/// Creates an `Error` for a connection that closed with requests pending.
pub fn premature_close() -> Error {
    Error::new(Kind::PrematureClose).with(ConnectionClosed)
}

/// Creates an `Error` for a read that failed because the transport broke.
pub fn connection_lost<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::PrematureClose).with(e.into())
}

/// Creates an `Error` for a message cut off by end-of-stream.
///
/// The peer closed inside a response whose framing promised more bytes, so
/// this is a framing failure rather than a clean close between responses.
pub fn incomplete_message() -> Error {
    Error::new(Kind::Parse).with(IncompleteMessage)
}

/// Creates an `Error` for an operation that made no progress in time.
pub fn timed_out() -> Error {
    Error::new(Kind::Timeout).with(TimedOut)
}

/// Creates an `Error` for a request abandoned at the batch deadline.
pub fn canceled() -> Error {
    Error::new(Kind::Canceled).with(OperationCanceled)
}

/// Creates an `Error` for a body over the configured ceiling.
pub fn payload_too_large(len: u64, limit: usize) -> Error {
    Error::new(Kind::PayloadTooLarge).with(format!("{len} bytes exceeds limit of {limit}"))
}
