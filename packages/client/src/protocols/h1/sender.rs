//! Writing side of a round
//!
//! Requests are serialized back to back into a buffered writer with no
//! waiting for responses in between. Each request is pushed onto the
//! pending queue only after its bytes were accepted by the writer, so the
//! reader never expects a response to a request that was not sent.

use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use super::encode::{EncodeContext, encode_request};
use super::queue::{Pending, PendingSender};
use crate::error::{self, Error};
use crate::http::PipelineRequest;
use crate::telemetry::PipelineStats;

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// What happened to each request handed to the sender.
#[derive(Debug, Default)]
pub struct SendReport {
    /// Requests written and queued for the reader
    pub written: usize,
    /// Requests never written (suffix after a failure or after the reader
    /// stopped); they were not attempted
    pub unsent: Vec<usize>,
    /// Requests written, in whole or in part, after the reader had given up
    pub rejected: Vec<usize>,
    /// The request whose write failed, with the error
    pub failed: Option<(usize, Error)>,
    /// The connection's write side is unusable
    pub broken: bool,
}

pub struct SendOptions<'a> {
    pub encode: &'a EncodeContext,
    /// Mark the last request with `Connection: close`
    pub close_last: bool,
    pub write_timeout: Duration,
    pub stats: &'a PipelineStats,
}

/// Write `requests` in order, pushing each onto `queue` once written.
///
/// Never fails as a whole: problems are attributed to requests in the
/// returned report. The queue end is dropped on return, which tells the
/// reader no more entries will arrive.
pub async fn send_requests<W>(
    writer: W,
    requests: &[&PipelineRequest],
    queue: PendingSender,
    options: SendOptions<'_>,
) -> SendReport
where
    W: AsyncWrite + Unpin,
{
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, writer);
    let mut scratch = BytesMut::with_capacity(1024);
    let mut report = SendReport::default();
    let last = requests.len().saturating_sub(1);

    for (position, request) in requests.iter().enumerate() {
        if queue.is_closed() {
            report
                .unsent
                .extend(requests[position..].iter().map(|r| r.index()));
            break;
        }

        scratch.clear();
        let close = options.close_last && position == last;
        let len = encode_request(request, options.encode, close, &mut scratch);

        let written = tokio::select! {
            written = tokio::time::timeout(options.write_timeout, writer.write_all(&scratch)) => written,
            () = queue.closed() => {
                tracing::debug!(index = request.index(), "reader stopped during write");
                report.rejected.push(request.index());
                report
                    .unsent
                    .extend(requests[position + 1..].iter().map(|r| r.index()));
                report.broken = true;
                return report;
            }
        };
        let failure = match written {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(error::write(e)),
            Err(_) => Some(error::timed_out()),
        };
        if let Some(err) = failure {
            tracing::warn!(index = request.index(), error = %err, "request write failed");
            report.failed = Some((request.index(), err));
            report.broken = true;
            report
                .unsent
                .extend(requests[position + 1..].iter().map(|r| r.index()));
            return report;
        }

        let pending = Pending {
            index: request.index(),
            head: request.is_head(),
        };
        if !queue.push(pending) {
            report.rejected.push(request.index());
            report
                .unsent
                .extend(requests[position + 1..].iter().map(|r| r.index()));
            break;
        }
        report.written += 1;
        options.stats.record_written(len);
    }

    // Once the reader is gone nobody drains the peer, so a flush may never
    // complete; the queued entries were already failed by the reader.
    let flushed = tokio::select! {
        flushed = tokio::time::timeout(options.write_timeout, writer.flush()) => flushed,
        () = queue.closed() => {
            report.broken = true;
            return report;
        }
    };
    match flushed {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "flushing pipelined requests failed");
            report.broken = true;
        }
        Err(_) => {
            tracing::warn!("flushing pipelined requests timed out");
            report.broken = true;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{BatchSpec, RequestOverride};
    use crate::protocols::h1::queue::pending_queue;
    use tokio::io::AsyncReadExt;

    fn ctx() -> EncodeContext {
        EncodeContext {
            authority: "example.com".to_string(),
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn writes_all_requests_and_queues_them_in_order() {
        let requests = BatchSpec::head()
            .targets(["/a", "/b", "/c"])
            .into_requests()
            .unwrap();
        let refs: Vec<&PipelineRequest> = requests.iter().collect();
        let (client, mut server) = tokio::io::duplex(4096);
        let (tx, mut rx) = pending_queue();
        let stats = PipelineStats::default();
        let encode = ctx();

        let report = send_requests(
            client,
            &refs,
            tx,
            SendOptions {
                encode: &encode,
                close_last: true,
                write_timeout: Duration::from_secs(5),
                stats: &stats,
            },
        )
        .await;

        assert_eq!(report.written, 3);
        assert!(report.unsent.is_empty());
        assert!(!report.broken);

        let mut queued = Vec::new();
        while let Some(pending) = rx.next().await {
            queued.push(pending.index);
        }
        assert_eq!(queued, vec![0, 1, 2]);

        let mut wire = String::new();
        server.read_to_string(&mut wire).await.unwrap();
        assert_eq!(wire.matches("HEAD ").count(), 3);
        assert!(wire.find("/a").unwrap() < wire.find("/b").unwrap());
        assert_eq!(wire.matches("connection: close").count(), 1);
        assert_eq!(stats.snapshot().requests_written, 3);
    }

    #[tokio::test]
    async fn closed_queue_leaves_requests_unsent() {
        let requests = BatchSpec::get().targets(["/a", "/b"]).into_requests().unwrap();
        let refs: Vec<&PipelineRequest> = requests.iter().collect();
        let (client, _server) = tokio::io::duplex(4096);
        let (tx, mut rx) = pending_queue();
        rx.close_and_drain();
        let stats = PipelineStats::default();
        let encode = ctx();

        let report = send_requests(
            client,
            &refs,
            tx,
            SendOptions {
                encode: &encode,
                close_last: false,
                write_timeout: Duration::from_secs(5),
                stats: &stats,
            },
        )
        .await;

        assert_eq!(report.written, 0);
        assert_eq!(report.unsent, vec![0, 1]);
    }

    async fn send_to_dropped_peer(requests: &[PipelineRequest]) -> SendReport {
        let refs: Vec<&PipelineRequest> = requests.iter().collect();
        let (client, server) = tokio::io::duplex(8);
        drop(server);
        let (tx, _rx) = pending_queue();
        let stats = PipelineStats::default();
        let encode = ctx();
        send_requests(
            client,
            &refs,
            tx,
            SendOptions {
                encode: &encode,
                close_last: false,
                write_timeout: Duration::from_secs(5),
                stats: &stats,
            },
        )
        .await
    }

    #[tokio::test]
    async fn buffered_requests_fail_at_flush() {
        let requests = BatchSpec::get()
            .targets(["/a", "/b", "/c"])
            .into_requests()
            .unwrap();
        let report = send_to_dropped_peer(&requests).await;

        assert!(report.broken);
        assert_eq!(report.written, 3);
        assert!(report.failed.is_none());
    }

    #[tokio::test]
    async fn large_write_failure_is_attributed_and_suffix_unsent() {
        let requests = BatchSpec::new(http::Method::PUT)
            .request(RequestOverride::new("/big").body(vec![b'x'; 2 * WRITE_BUFFER_SIZE]))
            .target("/b")
            .target("/c")
            .into_requests()
            .unwrap();
        let report = send_to_dropped_peer(&requests).await;

        assert!(report.broken);
        assert_eq!(report.written, 0);
        let (index, err) = report.failed.unwrap();
        assert_eq!(index, 0);
        assert_eq!(err.kind(), crate::error::Kind::Write);
        assert_eq!(report.unsent, vec![1, 2]);
    }
}
