//! FIFO of requests written but not yet answered
//!
//! The sender pushes an entry only after the request's bytes were handed
//! to the connection; the reader pops one entry per response. HTTP/1.1
//! answers in request order, so the head of the queue is always the request
//! the next response belongs to.

use tokio::sync::mpsc;

/// One written, unanswered request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    /// Batch index of the request
    pub index: usize,
    /// The request was `HEAD`, so its response has no body
    pub head: bool,
}

/// Create a connected pair of queue ends.
pub fn pending_queue() -> (PendingSender, PendingReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PendingSender { tx }, PendingReceiver { rx })
}

/// Write side, owned by the sender.
#[derive(Debug)]
pub struct PendingSender {
    tx: mpsc::UnboundedSender<Pending>,
}

impl PendingSender {
    /// Append an entry. Returns false once the reader has given up.
    pub fn push(&self, pending: Pending) -> bool {
        self.tx.send(pending).is_ok()
    }

    /// Whether the reader has stopped accepting entries.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the reader has stopped accepting entries.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Read side, owned by the reader.
#[derive(Debug)]
pub struct PendingReceiver {
    rx: mpsc::UnboundedReceiver<Pending>,
}

impl PendingReceiver {
    /// Next entry, or `None` once the sender is done and the queue is empty.
    pub async fn next(&mut self) -> Option<Pending> {
        self.rx.recv().await
    }

    /// Refuse further pushes and take everything still queued, in order.
    pub fn close_and_drain(&mut self) -> Vec<Pending> {
        self.rx.close();
        let mut drained = Vec::new();
        while let Ok(pending) = self.rx.try_recv() {
            drained.push(pending);
        }
        drained
    }
}
