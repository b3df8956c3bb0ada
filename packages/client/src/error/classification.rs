use std::error::Error as StdError;
use std::io;

use super::helpers::{ConnectionClosed, TimedOut};
use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error came from invalid batch input.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if the error came from an invalid configuration.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self.inner.kind, Kind::Config)
    }

    /// Returns true if the error happened while opening the connection.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    /// Returns true if the error is related to a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if matches!(self.inner.kind, Kind::Timeout) {
            return true;
        }

        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<TimedOut>() {
                return true;
            }
            if let Some(io) = err.downcast_ref::<io::Error>() {
                if io.kind() == io::ErrorKind::TimedOut {
                    return true;
                }
            }
            source = err.source();
        }

        false
    }

    /// Returns true if the peer closed the connection under us.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        if matches!(self.inner.kind, Kind::PrematureClose) {
            return true;
        }

        let mut source = self.source();
        while let Some(err) = source {
            if err.is::<ConnectionClosed>() {
                return true;
            }
            if let Some(io) = err.downcast_ref::<io::Error>() {
                if matches!(
                    io.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::BrokenPipe
                        | io::ErrorKind::UnexpectedEof
                ) {
                    return true;
                }
            }
            source = err.source();
        }

        false
    }

    /// Returns true if the response stream lost FIFO framing.
    #[must_use]
    pub fn is_desync(&self) -> bool {
        matches!(self.inner.kind, Kind::Parse)
    }

    /// Returns true if the failed request may be resubmitted on a fresh connection.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.inner.kind {
            Kind::Connect
            | Kind::Write
            | Kind::Parse
            | Kind::PrematureClose
            | Kind::Timeout => true,
            Kind::Builder | Kind::Config | Kind::Canceled | Kind::PayloadTooLarge => false,
        }
    }

    /// The error handed to requests queued behind the one that failed.
    ///
    /// An oversized body leaves the stream mid-message, so followers see a
    /// desync rather than a terminal size error of their own.
    #[must_use]
    pub(crate) fn for_followers(&self) -> Error {
        match self.inner.kind {
            Kind::PayloadTooLarge => {
                Error::new(Kind::Parse).with("pipeline abandoned after an oversized response")
            }
            _ => {
                let mut err = self.clone();
                err.inner.target = None;
                err
            }
        }
    }
}
