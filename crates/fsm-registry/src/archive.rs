// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Archival retry with backoff and critical-failure escalation (§4.6,
//! spec scenario 6 "archival rollback"). `fsm_storage::archive_row`
//! itself only knows how to attempt one move; the policy of retrying
//! and eventually giving up belongs here, grounded on the teacher's
//! `UsageMetricsCollector` pattern of a fallible periodic operation
//! wrapped by a caller-supplied health/failure signal
//! (`crates/daemon/src/engine/usage_metrics.rs`).

use fsm_core::{MachineId, PersistenceError, PersistentContext};
use fsm_storage::{archive_row, PersistenceAdapter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Retry shape for archival. Backoff doubles after every failed attempt,
/// starting from `initial_backoff`.
#[derive(Debug, Clone)]
pub struct ArchivePolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for ArchivePolicy {
    fn default() -> Self {
        Self { max_attempts: 5, initial_backoff: Duration::from_millis(100) }
    }
}

/// Invoked exactly once, after `max_attempts` archival attempts have all
/// failed. The registry treats this as fatal (§8 scenario 6): the
/// callback is expected to stop the process from accepting new work.
pub type CriticalFailureCallback = Arc<dyn Fn(&MachineId, &PersistenceError) + Send + Sync>;

/// Owns the destination store for completed machines plus the retry
/// policy around moving a row into it.
#[derive(Clone)]
pub struct Archiver<H> {
    destination: Arc<H>,
    policy: ArchivePolicy,
    on_critical_failure: CriticalFailureCallback,
}

impl<H> Archiver<H> {
    pub fn new(destination: Arc<H>, policy: ArchivePolicy, on_critical_failure: CriticalFailureCallback) -> Self {
        Self { destination, policy, on_critical_failure }
    }

    /// Move `id`'s row from `active` into the archival destination,
    /// retrying on failure. On a successful move the row is no longer in
    /// `active`. On permanent failure the row is left untouched in
    /// `active` and the critical-failure callback fires once.
    pub async fn archive<P, A>(&self, active: &A, id: &MachineId)
    where
        P: PersistentContext,
        A: PersistenceAdapter<P>,
        H: PersistenceAdapter<P>,
    {
        let mut attempt = 0u32;
        let mut backoff = self.policy.initial_backoff;
        loop {
            attempt += 1;
            match archive_row(active, self.destination.as_ref(), id).await {
                Ok(()) => {
                    tracing::debug!(%id, attempt, "machine archived");
                    return;
                }
                Err(error) if attempt >= self.policy.max_attempts => {
                    tracing::error!(%id, %error, attempt, "archival permanently failed");
                    (self.on_critical_failure)(id, &error);
                    return;
                }
                Err(error) => {
                    tracing::warn!(%id, %error, attempt, ?backoff, "archival attempt failed, retrying");
                    sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
