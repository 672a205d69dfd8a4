// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The registry (§4.6): register/route/evict/archive, strict per-machine
//! serialisation, and lazy rehydration on a miss. Grounded on the
//! teacher's `Runtime` (`crates/daemon/src/engine/runtime/mod.rs`) as the
//! one place that owns every live entity, generalised here into one task
//! per machine instead of one task owning a shared `MaterializedState`.

use crate::archive::Archiver;
use crate::mailbox::{self, Envelope, MachineHandle, MAILBOX_CAPACITY};
use fsm_core::{Clock, MachineEvent, MachineId, PersistentContext, RegistryError, VolatileContext};
use fsm_engine::{DispatchResult, MachineDefinition};
use fsm_history::HistoryTracker;
use fsm_storage::PersistenceAdapter;
use fsm_timeout::TimeoutManager;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Handles<E> = Arc<Mutex<HashMap<MachineId, MachineHandle<E>>>>;

/// Owns every live machine instance. Clone is shallow: every clone shares
/// the same live map, persistence adapter, history tracker, archiver, and
/// timeout manager.
pub struct Registry<P, V, E, A, AR, C> {
    definition: Arc<MachineDefinition<P, V, E>>,
    event_types: Arc<fsm_core::EventTypeRegistry>,
    active: Arc<A>,
    history: HistoryTracker,
    timeouts: TimeoutManager,
    archiver: Archiver<AR>,
    clock: C,
    handles: Handles<E>,
}

impl<P, V, E, A, AR, C> Clone for Registry<P, V, E, A, AR, C> {
    fn clone(&self) -> Self {
        Self {
            definition: Arc::clone(&self.definition),
            event_types: Arc::clone(&self.event_types),
            active: Arc::clone(&self.active),
            history: self.history.clone(),
            timeouts: self.timeouts.clone(),
            archiver: self.archiver.clone(),
            clock: self.clock.clone(),
            handles: Arc::clone(&self.handles),
        }
    }
}

impl<P, V, E, A, AR, C> Registry<P, V, E, A, AR, C>
where
    P: PersistentContext,
    V: VolatileContext<P>,
    E: MachineEvent,
    A: PersistenceAdapter<P> + 'static,
    AR: PersistenceAdapter<P> + 'static,
    C: Clock,
{
    pub fn new(
        definition: Arc<MachineDefinition<P, V, E>>,
        event_types: Arc<fsm_core::EventTypeRegistry>,
        active: Arc<A>,
        history: HistoryTracker,
        archiver: Archiver<AR>,
        clock: C,
    ) -> Self {
        let handles: Handles<E> = Arc::new(Mutex::new(HashMap::new()));
        let fire_handles = Arc::clone(&handles);
        let timeouts = TimeoutManager::new(move |id, source_state, target_state| {
            let handle = fire_handles.lock().get(&id).map(|h| h.tx.clone());
            let Some(tx) = handle else {
                tracing::debug!(%id, "timeout fired for a machine with no live mailbox, dropped");
                return;
            };
            if tx.try_send(Envelope::Timeout { source_state, target_state }).is_err() {
                tracing::warn!(%id, "mailbox full or closed, timeout delivery dropped");
            }
        });

        Self { definition, event_types, active, history, timeouts, archiver, clock, handles }
    }

    /// Register a brand-new machine, persist its initial row, and start
    /// its mailbox task.
    pub async fn register(&self, persistent: P) -> Result<MachineId, RegistryError> {
        let id = persistent.id().clone();
        let now_ms = self.clock.epoch_ms();
        let (machine, records, directive) =
            fsm_engine::MachineInstance::activate_new(Arc::clone(&self.definition), Arc::clone(&self.event_types), persistent, now_ms);
        self.active.insert(machine.persistent().clone(), now_ms).await?;
        self.spawn(machine, records, directive);
        Ok(id)
    }

    /// Route `event` to `id`'s mailbox, rehydrating from the active store
    /// on a miss (§4.6). Returns the dispatch outcome; history records and
    /// the persisted write-back already happened on the mailbox task by
    /// the time this resolves.
    pub async fn route(&self, id: &MachineId, event: E) -> Result<DispatchResult, RegistryError> {
        let tx = self.tx_for(id).await?;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(Envelope::External { event, reply: reply_tx })
            .await
            .map_err(|_| RegistryError::UnknownMachine(id.clone()))?;
        reply_rx.await.map_err(|_| RegistryError::UnknownMachine(id.clone()))
    }

    /// Drop a machine's live mailbox without touching its persisted row —
    /// a later `route` call rehydrates it (§4.6 eviction).
    pub fn evict(&self, id: &MachineId) {
        self.handles.lock().remove(id);
    }

    pub fn is_live(&self, id: &MachineId) -> bool {
        self.handles.lock().contains_key(id)
    }

    async fn tx_for(&self, id: &MachineId) -> Result<mpsc::Sender<Envelope<E>>, RegistryError> {
        if let Some(handle) = self.handles.lock().get(id) {
            return Ok(handle.tx.clone());
        }

        let stored = self.active.find_by_id(id).await?.ok_or_else(|| RegistryError::UnknownMachine(id.clone()))?;
        if stored.complete() {
            return Err(RegistryError::AlreadyComplete(id.clone()));
        }

        let (machine, records, directive) = fsm_engine::MachineInstance::activate_rehydrated(
            Arc::clone(&self.definition),
            Arc::clone(&self.event_types),
            stored,
            self.clock.epoch_ms(),
        );
        let tx = self.spawn(machine, records, directive);
        Ok(tx)
    }

    fn spawn(
        &self,
        machine: fsm_engine::MachineInstance<P, V, E>,
        records: Vec<fsm_core::HistoryRecord>,
        directive: fsm_engine::TimerDirective,
    ) -> mpsc::Sender<Envelope<E>> {
        let id = machine.id().clone();
        for record in records {
            if let Err(error) = self.history.record(id.clone(), record) {
                tracing::warn!(%id, %error, "failed to enqueue activation history record");
            }
        }
        match &directive {
            fsm_engine::TimerDirective::Arm { delay, armed_for_state, target_state } => {
                self.timeouts.schedule(id.clone(), *delay, armed_for_state.clone(), target_state.clone());
            }
            fsm_engine::TimerDirective::Cancel => {
                self.timeouts.cancel(&id);
            }
            fsm_engine::TimerDirective::None => {}
        }

        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        self.handles.lock().insert(id.clone(), MachineHandle { tx: tx.clone() });

        let active = Arc::clone(&self.active);
        let history = self.history.clone();
        let timeouts = self.timeouts.clone();
        let archiver = self.archiver.clone();
        let clock = self.clock.clone();
        let handles = Arc::clone(&self.handles);
        tokio::spawn(async move {
            mailbox::run(machine, rx, active, history, timeouts, archiver, clock).await;
            handles.lock().remove(&id);
        });

        tx
    }

    /// Scan the active store for rows already in a final state (a machine
    /// that completed while the process was down) and archive them
    /// synchronously before accepting traffic (§4.6 "startup scan").
    /// `until_ms` should be set far enough in the future to cover every
    /// row the active store could hold.
    pub async fn startup_scan(&self, until_ms: u64) -> Result<usize, RegistryError> {
        let rows = self.active.find_all_by_date_range(0, until_ms).await?;
        let mut archived = 0;
        for row in rows {
            if !row.complete() {
                continue;
            }
            self.archiver.archive(self.active.as_ref(), row.id()).await;
            archived += 1;
        }
        Ok(archived)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
