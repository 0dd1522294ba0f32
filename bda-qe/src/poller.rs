// Copyright 2025 BDA Contributors
// Licensed under the Apache License, Version 2.0

//! Completion polling
//!
//! Status is polled until the service reports a terminal state. Between
//! polls the poller sleeps with exponential backoff capped at
//! `max_interval`. A deadline bounds the whole wait, and the caller's
//! cancellation token can end it early. In both cases the service is asked
//! to stop the execution.

use bda_client::QueryService;
use bda_common::{BdaError, PollConfig, QueryHandle, QueryState, Result};
use std::sync::Arc;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct CompletionPoller {
    service: Arc<dyn QueryService>,
    policy: PollConfig,
}

impl CompletionPoller {
    /// Fails with a configuration error for a policy that cannot back off
    pub fn new(service: Arc<dyn QueryService>, policy: PollConfig) -> Result<Self> {
        policy.validate()?;
        Ok(Self { service, policy })
    }

    pub fn policy(&self) -> &PollConfig {
        &self.policy
    }

    /// Wait until `handle` succeeds
    pub async fn await_completion(
        &self,
        handle: &QueryHandle,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let started = Instant::now();
        let deadline = started + self.policy.timeout();
        let mut interval = self.policy.initial_interval();
        let mut polls: u32 = 0;

        loop {
            let state = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.abandon(handle, PollExit::Cancelled).await),
                _ = sleep_until(deadline) => return Err(self.abandon(handle, PollExit::Timeout).await),
                status = self.service.get_status(handle) => status.map_err(|e| {
                    BdaError::Poll(format!("query {}: {}", handle, e.into_detail()))
                })?,
            };
            polls += 1;

            match state {
                QueryState::Succeeded => {
                    log::info!(
                        "Query {} succeeded after {} polls in {:?}",
                        handle,
                        polls,
                        started.elapsed()
                    );
                    return Ok(());
                }
                QueryState::Failed => {
                    return Err(BdaError::QueryFailed {
                        handle: handle.to_string(),
                        reason: format!("service reported {}", state),
                    });
                }
                QueryState::Cancelled => {
                    return Err(BdaError::QueryCancelled(handle.to_string()));
                }
                QueryState::Queued | QueryState::Running => {
                    log::debug!("Query {} is {}, next poll in {:?}", handle, state, interval);
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.abandon(handle, PollExit::Timeout).await);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.abandon(handle, PollExit::Cancelled).await),
                _ = sleep(interval.min(remaining)) => {}
            }
            interval = self.policy.next_interval(interval);
        }
    }

    /// Stop the remote execution (best effort) and build the error to return
    async fn abandon(&self, handle: &QueryHandle, exit: PollExit) -> BdaError {
        if let Err(e) = self.service.cancel_query(handle).await {
            log::warn!("Failed to stop query {}: {}", handle, e);
        }

        match exit {
            PollExit::Timeout => {
                log::warn!(
                    "Query {} did not finish within {:?}",
                    handle,
                    self.policy.timeout()
                );
                BdaError::Timeout(format!(
                    "query {} did not finish within {:?}",
                    handle,
                    self.policy.timeout()
                ))
            }
            PollExit::Cancelled => {
                log::info!("Stopped waiting for query {}", handle);
                BdaError::Cancelled(format!("waiting for query {} was cancelled", handle))
            }
        }
    }
}

enum PollExit {
    Timeout,
    Cancelled,
}
