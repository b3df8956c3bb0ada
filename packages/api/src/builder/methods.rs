//! Batch contents, tuning and execution

use std::time::{Duration, Instant};

use hpipe_client::{BatchResult, PipelineClient, Result};

use crate::builder::core::Pipeline;

impl Pipeline {
    /// Add one request target (origin form, e.g. `/bucket/key?versionId=1`).
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.batch = self.batch.target(target);
        self
    }

    /// Add many request targets, kept in order.
    #[must_use]
    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.batch = self.batch.targets(targets);
        self
    }

    /// Requests written per round.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config = self.config.with_max_pipeline_depth(depth);
        self
    }

    /// Attempts per request, the first one included.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config = self.config.with_max_attempts(attempts);
        self
    }

    /// Delay before the first retry; later retries back off exponentially.
    #[must_use]
    pub fn backoff(mut self, base: Duration) -> Self {
        self.config = self.config.with_backoff_base(base);
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_connect_timeout(timeout);
        self
    }

    /// Longest wait for progress on a response.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_read_timeout(timeout);
        self
    }

    /// Give up on the whole batch after `budget`; unresolved requests fail
    /// with `Kind::Canceled`.
    #[must_use]
    pub fn deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(budget);
        self
    }

    /// Keep the connection open between rounds (default `true`).
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.config = self.config.with_keep_alive(keep_alive);
        self
    }

    /// Treat these response statuses as retryable while attempts remain.
    #[must_use]
    pub fn retry_on_status(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.config.retry = self.config.retry.clone().with_retry_on_status(statuses);
        self
    }

    /// Run the batch.
    ///
    /// # Errors
    ///
    /// `Kind::Builder` for misuse recorded while building or an empty
    /// batch, `Kind::Config` for an invalid configuration. Transport
    /// failures are reported per request in the result.
    pub async fn send(self) -> Result<BatchResult> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let started = Instant::now();
        let requests = self.batch.len();
        let client = PipelineClient::new(self.config)?;
        if self.debug_enabled {
            tracing::debug!(
                requests,
                endpoint = %client.config().authority(),
                depth = client.config().max_pipeline_depth,
                "sending pipelined batch"
            );
        }

        let result = match self.deadline {
            Some(budget) => client.run_until(self.batch, started + budget).await?,
            None => client.run(self.batch).await?,
        };

        if self.debug_enabled {
            tracing::debug!(
                matched = result.matched_count(),
                failed = result.failed_count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pipelined batch finished"
            );
        }
        Ok(result)
    }
}
