//! Connection manager: at most one live connection per session
//!
//! `acquire` hands out the current connection or opens a new one,
//! `mark_dead` forgets it after a failure, `close` shuts it down. Dropping
//! the manager drops the stream, so the socket is released on every exit
//! path, cancellation included.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWriteExt, ReadBuf};

use super::types::Connector;
use crate::error::{self, Result};
use crate::telemetry::PipelineStats;

/// A live connection owned by the manager.
#[derive(Debug)]
pub struct Connection<Io> {
    io: Io,
    id: u64,
    rounds_served: usize,
}

impl<Io> Connection<Io> {
    /// Session-local connection number, starting at 1.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn io_mut(&mut self) -> &mut Io {
        &mut self.io
    }

    pub(crate) fn finish_round(&mut self) {
        self.rounds_served += 1;
    }
}

/// Owns the session's single connection.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    current: Option<Connection<C::Io>>,
    next_id: u64,
    stats: Arc<PipelineStats>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, stats: Arc<PipelineStats>) -> Self {
        Self {
            connector,
            current: None,
            next_id: 1,
            stats,
        }
    }

    /// Current connection if it still looks usable, otherwise a new one.
    ///
    /// # Errors
    ///
    /// Returns the connector's error (always `Kind::Connect`) when a new
    /// connection cannot be opened.
    pub async fn acquire(&mut self) -> Result<&mut Connection<C::Io>> {
        let healthy = self.current.as_mut().map(|conn| is_idle_and_open(&mut conn.io));
        let reusable = match self.current.as_ref() {
            Some(conn) if healthy == Some(true) => {
                tracing::debug!(
                    connection = conn.id,
                    rounds = conn.rounds_served,
                    "reusing connection"
                );
                true
            }
            Some(conn) => {
                tracing::debug!(connection = conn.id, "idle connection closed by peer");
                false
            }
            None => false,
        };

        if !reusable {
            self.current = None;
            let endpoint = self.connector.endpoint();
            let io = match self.connector.connect().await {
                Ok(io) => io,
                Err(e) => {
                    self.stats.record_connect_failure();
                    tracing::warn!(%endpoint, error = %e, "connection failed");
                    return Err(e);
                }
            };
            let id = self.next_id;
            self.next_id += 1;
            self.stats.record_connection();
            tracing::debug!(connection = id, %endpoint, "connection opened");
            return Ok(self.current.insert(Connection {
                io,
                id,
                rounds_served: 0,
            }));
        }

        self.current
            .as_mut()
            .ok_or_else(|| error::connect("connection lost before reuse"))
    }

    /// Forget the current connection; the next `acquire` reconnects.
    pub fn mark_dead(&mut self) {
        if let Some(conn) = self.current.take() {
            tracing::debug!(connection = conn.id, "connection marked dead");
        }
    }

    /// Endpoint of the underlying connector, for logs.
    pub fn endpoint(&self) -> String {
        self.connector.endpoint()
    }

    /// Whether a connection is currently held.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current.is_some()
    }

    /// Gracefully shut down the current connection, if any.
    pub async fn close(&mut self) {
        if let Some(mut conn) = self.current.take() {
            if let Err(e) = conn.io.shutdown().await {
                tracing::debug!(connection = conn.id, error = %e, "shutdown failed");
            }
            tracing::debug!(
                connection = conn.id,
                rounds = conn.rounds_served,
                "connection closed"
            );
        }
    }
}

/// Non-blocking liveness probe for an idle keep-alive connection.
///
/// An idle connection must have nothing to read: EOF means the peer closed
/// it, stray bytes mean the previous exchange left garbage behind, and an
/// error means it is broken. Only "would block" counts as healthy.
fn is_idle_and_open<Io: AsyncRead + Unpin>(io: &mut Io) -> bool {
    let mut probe = [0u8; 1];
    let mut buf = ReadBuf::new(&mut probe);
    let mut cx = Context::from_waker(futures::task::noop_waker_ref());
    matches!(Pin::new(io).poll_read(&mut cx, &mut buf), Poll::Pending)
}
