//! Reading side of a round
//!
//! Pops the oldest pending entry, decodes exactly one response for it and
//! hands the pair to the caller. The first failure ends the round: the
//! request being read gets the error, every request still queued behind it
//! gets the follower form of the same error, and the queue is closed so the
//! sender stops.

use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::sync::Notify;

use super::decode::ResponseDecoder;
use super::queue::PendingReceiver;
use crate::error::{self, Error};
use crate::http::PipelineResponse;
use crate::telemetry::PipelineStats;

/// What the reader observed.
#[derive(Debug, Default)]
pub struct ReadReport {
    pub matched: usize,
    /// Requests that failed, in queue order
    pub failed: Vec<(usize, Error)>,
    /// Error given to requests behind the first failure; also used for
    /// requests the sender wrote after the reader stopped
    pub follower_error: Option<Error>,
    /// The connection ended cleanly: no failure, no EOF, nothing left over
    pub reusable: bool,
}

pub struct ReadOptions<'a> {
    pub read_timeout: Duration,
    pub stats: &'a PipelineStats,
    /// Signalled by the sender when the write side broke
    pub abort: &'a Notify,
}

/// Match responses to pending entries until the queue is exhausted or the
/// connection fails.
pub async fn read_responses<R, F>(
    mut reader: R,
    mut queue: PendingReceiver,
    mut decoder: ResponseDecoder,
    options: ReadOptions<'_>,
    mut on_response: F,
) -> ReadReport
where
    R: AsyncRead + Unpin,
    F: FnMut(usize, PipelineResponse),
{
    let mut report = ReadReport::default();

    while let Some(pending) = queue.next().await {
        let result = tokio::select! {
            biased;
            result = decoder.next_response(&mut reader, pending.head, options.read_timeout, options.stats) => result,
            () = options.abort.notified() => Err(error::write("request stream broke before the response arrived")),
        };

        match result {
            Ok(response) => {
                options.stats.record_matched();
                report.matched += 1;
                let keeps_alive = response.keeps_alive() && !decoder.is_eof();
                tracing::trace!(
                    index = pending.index,
                    status = response.status_code(),
                    "response matched"
                );
                on_response(pending.index, response);

                if !keeps_alive {
                    let rest = queue.close_and_drain();
                    let err = error::premature_close();
                    if !rest.is_empty() {
                        tracing::warn!(
                            index = pending.index,
                            pending = rest.len(),
                            "server closed the connection with requests pending"
                        );
                    }
                    report
                        .failed
                        .extend(rest.into_iter().map(|p| (p.index, err.clone())));
                    report.follower_error = Some(err);
                    return report;
                }
            }
            Err(err) => {
                if err.is_desync() {
                    options.stats.record_desync();
                    tracing::warn!(index = pending.index, error = %err, "response stream desynchronized");
                } else {
                    tracing::warn!(index = pending.index, error = %err, "reading response failed");
                }
                let followers = err.for_followers();
                let rest = queue.close_and_drain();
                report.failed.push((pending.index, err));
                report
                    .failed
                    .extend(rest.into_iter().map(|p| (p.index, followers.clone())));
                report.follower_error = Some(followers);
                return report;
            }
        }
    }

    report.reusable = !decoder.is_eof() && decoder.buffered() == 0;
    report
}
