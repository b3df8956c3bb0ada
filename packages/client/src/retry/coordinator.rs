//! Retry coordinator: drives a batch to completion over one session
//!
//! Every request moves through `Pending -> Sent -> {Matched | Failed}`.
//! A failed request with attempts left goes back to the front of the
//! pending queue, keeping batch order, and is resubmitted on the next round
//! after a backoff; one with no attempts left is terminal. Requests the
//! sender never wrote return to the queue without using an attempt.
//!
//! Matched responses are stored as soon as the reader produces them, so a
//! batch cut short by its deadline still reports everything that arrived.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::time::Instant;

use super::policy::RetryPolicy;
use crate::config::PipelineConfig;
use crate::connect::{ConnectionManager, Connector};
use crate::error::{self, Error};
use crate::http::{BatchResult, Failure, Outcome, PipelineRequest, PipelineResponse};
use crate::protocols::h1::{DecodeLimits, EncodeContext, RoundSettings, run_round};
use crate::telemetry::PipelineStats;

#[derive(Debug)]
enum SlotState {
    Pending,
    Matched(PipelineResponse),
    Failed(Error),
}

#[derive(Debug)]
struct Slot {
    attempts: u32,
    state: SlotState,
}

/// Per-batch bookkeeping, kept outside the drive future so a deadline can
/// drop the future and still read what was resolved.
struct BatchState {
    requests: Vec<PipelineRequest>,
    slots: Vec<Slot>,
    pending: VecDeque<usize>,
}

impl BatchState {
    fn new(requests: Vec<PipelineRequest>) -> Self {
        let slots = requests
            .iter()
            .map(|_| Slot {
                attempts: 0,
                state: SlotState::Pending,
            })
            .collect();
        let pending = (0..requests.len()).collect();
        Self {
            requests,
            slots,
            pending,
        }
    }
}

/// One pipelining session: a connection manager, the policy and counters.
pub struct RetryCoordinator<C: Connector> {
    manager: ConnectionManager<C>,
    policy: RetryPolicy,
    depth: usize,
    settings: RoundSettings,
    stats: Arc<PipelineStats>,
}

impl<C: Connector> RetryCoordinator<C> {
    pub fn new(connector: C, config: &PipelineConfig) -> Self {
        let stats = Arc::new(PipelineStats::default());
        Self {
            manager: ConnectionManager::new(connector, Arc::clone(&stats)),
            policy: config.retry.clone(),
            depth: config.max_pipeline_depth.max(1),
            settings: round_settings(config),
            stats,
        }
    }

    /// Session counters, shared with the connection manager.
    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Run `requests` until each one is matched or terminally failed, or
    /// until `deadline` passes.
    ///
    /// Requests still unresolved at the deadline fail with `Kind::Canceled`.
    /// The connection is closed before returning.
    pub async fn run(mut self, requests: Vec<PipelineRequest>, deadline: Option<Instant>) -> BatchResult {
        let mut state = BatchState::new(requests);
        tracing::debug!(
            requests = state.requests.len(),
            depth = self.depth,
            endpoint = %self.manager.endpoint(),
            "batch started"
        );

        let finished = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, self.drive(&mut state))
                .await
                .is_ok(),
            None => {
                self.drive(&mut state).await;
                true
            }
        };

        if finished {
            self.manager.close().await;
        } else {
            // The round was dropped mid-flight; its stream position is unknown.
            self.manager.mark_dead();
            let canceled = error::canceled();
            let mut unresolved = 0usize;
            for slot in &mut state.slots {
                if matches!(slot.state, SlotState::Pending) {
                    slot.state = SlotState::Failed(canceled.clone());
                    unresolved += 1;
                }
            }
            tracing::warn!(unresolved, "batch deadline expired");
        }

        let outcomes = state
            .slots
            .into_iter()
            .zip(state.requests)
            .map(|(slot, request)| match slot.state {
                SlotState::Matched(response) => Outcome::Matched {
                    response,
                    attempts: slot.attempts,
                },
                SlotState::Failed(error) => Outcome::Failed(failure(&request, slot.attempts, error)),
                // Only reachable if the drive loop ended with work queued.
                SlotState::Pending => {
                    Outcome::Failed(failure(&request, slot.attempts, error::canceled()))
                }
            })
            .collect();

        let stats = self.stats.snapshot();
        tracing::debug!(
            rounds = stats.rounds,
            matched = stats.responses_matched,
            retries = stats.retries_scheduled,
            "batch finished"
        );
        BatchResult::new(outcomes, stats)
    }

    async fn drive(&mut self, state: &mut BatchState) {
        let BatchState {
            requests,
            slots,
            pending,
        } = state;
        let mut consecutive_connect_failures = 0u32;
        let mut backoff = false;
        let mut round_no = 0usize;

        while !pending.is_empty() {
            let take = self.depth.min(pending.len());
            let round: Vec<usize> = pending.drain(..take).collect();

            if backoff {
                let attempts_made = round.iter().map(|&i| slots[i].attempts).max().unwrap_or(0);
                let delay = self.policy.calculate_delay(attempts_made);
                if !delay.is_zero() {
                    tracing::debug!(delay_ms = delay.as_millis() as u64, "backing off before retry");
                    self.stats.record_backoff(delay);
                    tokio::time::sleep(delay).await;
                }
            }

            let conn = match self.manager.acquire().await {
                Ok(conn) => {
                    consecutive_connect_failures = 0;
                    conn
                }
                Err(err) => {
                    consecutive_connect_failures += 1;
                    for &index in &round {
                        slots[index].attempts += 1;
                    }

                    if consecutive_connect_failures >= self.policy.max_consecutive_connect_failures {
                        let remaining = round.len() + pending.len();
                        tracing::error!(
                            failures = consecutive_connect_failures,
                            remaining,
                            error = %err,
                            "endpoint unreachable, failing the rest of the batch"
                        );
                        for index in round.into_iter().chain(pending.drain(..)) {
                            slots[index].state = SlotState::Failed(err.clone());
                        }
                        return;
                    }

                    let failed: Vec<(usize, Error)> =
                        round.iter().map(|&index| (index, err.clone())).collect();
                    let retried = self.settle(slots, pending, failed, Vec::new(), Vec::new());
                    backoff = retried > 0;
                    continue;
                }
            };

            round_no += 1;
            self.stats.record_round();
            for &index in &round {
                slots[index].attempts += 1;
            }
            tracing::debug!(
                round = round_no,
                depth = round.len(),
                connection = conn.id(),
                "round started"
            );

            let refs: Vec<&PipelineRequest> = round.iter().map(|&index| &requests[index]).collect();
            let policy = &self.policy;
            let mut status_retries = Vec::new();
            let report = run_round(
                conn.io_mut(),
                &refs,
                &self.settings,
                &self.stats,
                |index, response| {
                    let slot = &mut slots[index];
                    if policy.is_retryable_status(response.status_code())
                        && policy.has_attempts_left(slot.attempts)
                    {
                        tracing::debug!(
                            index,
                            status = response.status_code(),
                            attempt = slot.attempts,
                            "status marked for retry"
                        );
                        status_retries.push(index);
                    } else {
                        slot.state = SlotState::Matched(response);
                    }
                },
            )
            .await;
            conn.finish_round();

            if !report.reusable {
                self.manager.mark_dead();
            }

            for &index in &report.unsent {
                slots[index].attempts = slots[index].attempts.saturating_sub(1);
            }
            let retried = self.settle(slots, pending, report.failed, status_retries, report.unsent);
            backoff = retried > 0;
        }
    }

    /// Resolve or requeue the unmatched requests of a round.
    ///
    /// Returns how many requests were scheduled for another attempt.
    fn settle(
        &self,
        slots: &mut [Slot],
        pending: &mut VecDeque<usize>,
        failed: Vec<(usize, Error)>,
        status_retries: Vec<usize>,
        unsent: Vec<usize>,
    ) -> usize {
        let mut requeue: Vec<usize> = unsent;
        let mut retried = status_retries.len();
        requeue.extend(status_retries);

        for (index, err) in failed {
            let slot = &mut slots[index];
            if err.is_retryable() && self.policy.has_attempts_left(slot.attempts) {
                tracing::warn!(
                    index,
                    attempt = slot.attempts,
                    error = %err,
                    "request failed, scheduling retry"
                );
                requeue.push(index);
                retried += 1;
            } else {
                tracing::warn!(index, attempts = slot.attempts, error = %err, "request failed");
                slot.state = SlotState::Failed(err);
            }
        }

        requeue.sort_unstable();
        for &index in requeue.iter().rev() {
            pending.push_front(index);
        }
        self.stats.record_retries(retried);
        retried
    }
}

fn failure(request: &PipelineRequest, attempts: u32, error: Error) -> Failure {
    Failure {
        kind: error.kind(),
        attempts,
        method: request.method().clone(),
        target: request.target().to_string(),
        error: error.with_target(request.target()),
    }
}

/// Round settings for a session against `config`'s endpoint.
pub(crate) fn round_settings(config: &PipelineConfig) -> RoundSettings {
    RoundSettings {
        encode: EncodeContext {
            authority: config.authority(),
            user_agent: config.user_agent.clone(),
        },
        limits: DecodeLimits {
            max_headers: config.max_headers,
            max_head_size: config.max_head_size,
            max_body_size: config.max_body_size,
        },
        read_buffer_size: config.read_buffer_size,
        read_timeout: config.timeouts.read_timeout,
        write_timeout: config.timeouts.write_timeout,
        close_after: !config.keep_alive,
    }
}
