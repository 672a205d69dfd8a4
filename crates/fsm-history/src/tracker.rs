// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The history tracker (§4.5): one background worker drains an
//! append-only queue of records and writes them to each machine's own
//! table. Modelled on the teacher's background collector
//! (`crates/daemon/src/engine/usage_metrics.rs`'s `UsageMetricsCollector`)
//! — a single `tokio::spawn`ed loop owning the write path, fed here by a
//! channel instead of a timer tick.

use crate::record_store::{table_name_for, HistoryStore};
use fsm_core::{HistoryRecord, MachineId, PersistenceError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Append {
    id: MachineId,
    record: HistoryRecord,
}

/// Handle to the background writer. Cloning shares the same channel, so
/// every machine's dispatch path can hold a clone without contending on a
/// lock — records are serialised by the single consuming task instead.
#[derive(Clone)]
pub struct HistoryTracker {
    tx: mpsc::UnboundedSender<Append>,
}

impl HistoryTracker {
    /// Spawn the writer task over `store` and return a handle plus its
    /// `JoinHandle` (for orderly shutdown: drop every `HistoryTracker`
    /// clone, then await the handle so the channel drains before exit).
    pub fn spawn<S>(store: Arc<S>) -> (Self, JoinHandle<()>)
    where
        S: HistoryStore + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Append>();

        let handle = tokio::spawn(async move {
            while let Some(Append { id, record }) = rx.recv().await {
                let table = table_name_for(&id);
                if let Err(error) = store.ensure_table(&table).await {
                    tracing::warn!(%id, %error, "failed to ensure history table");
                    continue;
                }
                if let Err(error) = store.append(&table, record).await {
                    tracing::warn!(%id, %error, "failed to append history record");
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Enqueue one record for `id`'s history. Never blocks the caller on
    /// I/O — the write happens on the background task.
    pub fn record(&self, id: MachineId, record: HistoryRecord) -> Result<(), PersistenceError> {
        self.tx
            .send(Append { id, record })
            .map_err(|_| PersistenceError::Io("history tracker worker has stopped".to_string()))
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
