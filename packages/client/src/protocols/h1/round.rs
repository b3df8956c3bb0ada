//! One round: a burst of pipelined writes and the matching reads
//!
//! The sender and the reader run concurrently on the two halves of the
//! same connection, joined by the pending queue. Running them together
//! keeps the server from stalling on a full socket buffer while a deep
//! pipeline is still being written.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;

use super::decode::{DecodeLimits, ResponseDecoder};
use super::encode::EncodeContext;
use super::queue::pending_queue;
use super::reader::{ReadOptions, read_responses};
use super::sender::{SendOptions, send_requests};
use crate::error::{self, Error};
use crate::http::{PipelineRequest, PipelineResponse};
use crate::telemetry::PipelineStats;

/// Per-round settings derived from the session configuration.
#[derive(Debug, Clone)]
pub struct RoundSettings {
    pub encode: EncodeContext,
    pub limits: DecodeLimits,
    pub read_buffer_size: usize,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Ask the server to close after the last request of the round
    pub close_after: bool,
}

/// Per-request results of a round that did not end in a matched response.
#[derive(Debug, Default)]
pub struct RoundReport {
    pub written: usize,
    pub matched: usize,
    /// Attempted requests that failed
    pub failed: Vec<(usize, Error)>,
    /// Requests never written; their attempt does not count
    pub unsent: Vec<usize>,
    /// The connection can carry another round
    pub reusable: bool,
}

/// Pipeline `requests` over `io` and match every response in order.
///
/// Matched responses go to `on_response` as they arrive. Every request
/// handed in is accounted for exactly once: matched, failed or unsent.
pub async fn run_round<Io, F>(
    io: &mut Io,
    requests: &[&PipelineRequest],
    settings: &RoundSettings,
    stats: &PipelineStats,
    on_response: F,
) -> RoundReport
where
    Io: AsyncRead + AsyncWrite + Unpin,
    F: FnMut(usize, PipelineResponse),
{
    let (read_half, write_half) = tokio::io::split(io);
    let (queue_tx, queue_rx) = pending_queue();
    let abort = Notify::new();
    let decoder = ResponseDecoder::new(settings.read_buffer_size, settings.limits);

    let send = async {
        let report = send_requests(
            write_half,
            requests,
            queue_tx,
            SendOptions {
                encode: &settings.encode,
                close_last: settings.close_after,
                write_timeout: settings.write_timeout,
                stats,
            },
        )
        .await;
        if report.broken {
            abort.notify_one();
        }
        report
    };
    let read = read_responses(
        read_half,
        queue_rx,
        decoder,
        ReadOptions {
            read_timeout: settings.read_timeout,
            stats,
            abort: &abort,
        },
        on_response,
    );

    let (sent, read) = tokio::join!(send, read);

    let mut report = RoundReport {
        written: sent.written,
        matched: read.matched,
        failed: read.failed,
        unsent: sent.unsent,
        reusable: read.reusable && !sent.broken && !settings.close_after,
    };

    if !sent.rejected.is_empty() {
        let err = read.follower_error.unwrap_or_else(error::premature_close);
        report
            .failed
            .extend(sent.rejected.into_iter().map(|index| (index, err.clone())));
    }
    if let Some(failed) = sent.failed {
        report.failed.push(failed);
    }

    tracing::debug!(
        written = report.written,
        matched = report.matched,
        failed = report.failed.len(),
        unsent = report.unsent.len(),
        reusable = report.reusable,
        "round finished"
    );
    report
}
