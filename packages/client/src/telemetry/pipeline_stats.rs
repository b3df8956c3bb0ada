//! Per-session pipelining statistics with cache-padded atomic counters
//!
//! The sender, the reader and the connection manager of one session all
//! bump the same counters; nothing here is shared across sessions.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_utils::CachePadded;

/// Thread-safe session statistics
#[derive(Debug)]
pub struct PipelineStats {
    /// Connections successfully opened (TCP connect plus TLS handshake)
    pub connections_opened: CachePadded<AtomicUsize>,
    /// Failed connection attempts
    pub connect_failures: CachePadded<AtomicUsize>,
    /// Rounds started (one per pipelined write burst)
    pub rounds: CachePadded<AtomicUsize>,
    /// Requests fully written to a connection
    pub requests_written: CachePadded<AtomicUsize>,
    /// Responses parsed and paired with a request
    pub responses_matched: CachePadded<AtomicUsize>,
    /// Requests resubmitted after a failure
    pub retries_scheduled: CachePadded<AtomicUsize>,
    /// Rounds abandoned because response framing could not be trusted
    pub desyncs: CachePadded<AtomicUsize>,
    /// Request bytes written
    pub bytes_written: CachePadded<AtomicU64>,
    /// Response bytes read
    pub bytes_read: CachePadded<AtomicU64>,
    /// Time spent sleeping between attempts, in microseconds
    pub backoff_micros: CachePadded<AtomicU64>,
    started: Instant,
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self {
            connections_opened: CachePadded::new(AtomicUsize::new(0)),
            connect_failures: CachePadded::new(AtomicUsize::new(0)),
            rounds: CachePadded::new(AtomicUsize::new(0)),
            requests_written: CachePadded::new(AtomicUsize::new(0)),
            responses_matched: CachePadded::new(AtomicUsize::new(0)),
            retries_scheduled: CachePadded::new(AtomicUsize::new(0)),
            desyncs: CachePadded::new(AtomicUsize::new(0)),
            bytes_written: CachePadded::new(AtomicU64::new(0)),
            bytes_read: CachePadded::new(AtomicU64::new(0)),
            backoff_micros: CachePadded::new(AtomicU64::new(0)),
            started: Instant::now(),
        }
    }
}

/// Immutable snapshot of session statistics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStatsSnapshot {
    pub connections_opened: usize,
    pub connect_failures: usize,
    pub rounds: usize,
    pub requests_written: usize,
    pub responses_matched: usize,
    pub retries_scheduled: usize,
    pub desyncs: usize,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub backoff: Duration,
    pub elapsed: Duration,
}

impl PipelineStats {
    #[inline]
    pub fn record_connection(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_connect_failure(&self) {
        self.connect_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_round(&self) {
        self.rounds.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_written(&self, bytes: usize) {
        self.requests_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_matched(&self) {
        self.responses_matched.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_retries(&self, count: usize) {
        self.retries_scheduled.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_desync(&self) {
        self.desyncs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backoff(&self, delay: Duration) {
        let micros = u64::try_from(delay.as_micros()).unwrap_or(u64::MAX);
        self.backoff_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    #[inline]
    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            rounds: self.rounds.load(Ordering::Relaxed),
            requests_written: self.requests_written.load(Ordering::Relaxed),
            responses_matched: self.responses_matched.load(Ordering::Relaxed),
            retries_scheduled: self.retries_scheduled.load(Ordering::Relaxed),
            desyncs: self.desyncs.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            backoff: Duration::from_micros(self.backoff_micros.load(Ordering::Relaxed)),
            elapsed: self.started.elapsed(),
        }
    }
}

impl PipelineStatsSnapshot {
    /// Average requests written per round.
    #[inline]
    #[must_use]
    pub fn average_depth(&self) -> f64 {
        if self.rounds > 0 {
            self.requests_written as f64 / self.rounds as f64
        } else {
            0.0
        }
    }
}
