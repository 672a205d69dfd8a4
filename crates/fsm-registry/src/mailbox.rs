// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Per-machine mailboxes (§4.6, §5): a bounded channel plus a dedicated
//! task that owns one `MachineInstance`, giving strict per-machine
//! serialisation while machines still run in parallel with each other —
//! the same shape as the teacher's per-job/per-agent task ownership in
//! `crates/daemon/src/engine/runtime/mod.rs`, generalised from one
//! `Runtime` owning everything to one task per machine.

use crate::archive::Archiver;
use fsm_core::{Clock, MachineEvent, MachineId, PersistentContext, VolatileContext};
use fsm_engine::{DispatchResult, MachineInstance};
use fsm_history::HistoryTracker;
use fsm_storage::PersistenceAdapter;
use fsm_timeout::TimeoutManager;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Mailboxes are bounded: a runaway producer backs up instead of
/// exhausting memory, at the cost of `route` potentially waiting for
/// room (§5 doesn't mandate a specific depth).
pub const MAILBOX_CAPACITY: usize = 64;

pub(crate) enum Envelope<E> {
    External { event: E, reply: oneshot::Sender<DispatchResult> },
    /// A timer arrival. Carries the state the timer was armed *in* (the
    /// source state, compared against `currentState` to discard it if a
    /// transition has since moved the machine off that state — §5:
    /// "timeout events ... filtered at head by comparing armed state vs
    /// currentState") and the state it transitions *to* once that check
    /// passes.
    Timeout { source_state: String, target_state: String },
}

pub(crate) struct MachineHandle<E> {
    pub(crate) tx: mpsc::Sender<Envelope<E>>,
}

/// Runs `machine` to completion of its mailbox: persists each dispatch's
/// history and updated state, arms/cancels its timeout per the returned
/// directive, and replies to `External` sends. A dispatch that reaches a
/// final state triggers archival and ends the loop. Otherwise exits when
/// every sender (the registry's routing handle, and the timeout
/// manager's own `Envelope::Timeout` feed) has been dropped.
pub(crate) async fn run<P, V, E, A, H, C>(
    mut machine: MachineInstance<P, V, E>,
    mut rx: mpsc::Receiver<Envelope<E>>,
    active: Arc<A>,
    history: HistoryTracker,
    timeouts: TimeoutManager,
    archiver: Archiver<H>,
    clock: C,
) where
    P: PersistentContext,
    V: VolatileContext<P>,
    E: MachineEvent,
    A: PersistenceAdapter<P>,
    H: PersistenceAdapter<P>,
    C: Clock,
{
    while let Some(envelope) = rx.recv().await {
        let id = machine.id().clone();

        let result = match envelope {
            Envelope::External { event, reply } => {
                let result = machine.dispatch(&event, clock.epoch_ms());
                let _ = reply.send(DispatchResult {
                    outcome: result.outcome.clone(),
                    records: Vec::new(),
                    timer_directive: result.timer_directive.clone(),
                });
                result
            }
            Envelope::Timeout { source_state, target_state } => {
                // The timer manager already dropped this delivery if a
                // newer timer replaced it (generation-checked in
                // `TimeoutManager::schedule`); the only staleness left to
                // filter here is a transition having moved the machine
                // off the state this timer was armed in (§5).
                if machine.current_state() != source_state {
                    tracing::debug!(%id, armed_in = source_state, current = machine.current_state(), "stale timeout discarded at mailbox head");
                    continue;
                }
                machine.dispatch_timeout(&target_state, clock.epoch_ms())
            }
        };

        for record in result.records {
            if let Err(error) = history.record(id.clone(), record) {
                tracing::warn!(%id, %error, "failed to enqueue history record");
            }
        }

        if let Err(error) = active.update_by_id(machine.persistent().clone()).await {
            tracing::warn!(%id, %error, "failed to persist machine state after dispatch");
        }

        apply_timer_directive(&timeouts, &id, &result.timer_directive);

        if machine.is_complete() {
            archiver.archive(active.as_ref(), &id).await;
            break;
        }
    }
}

fn apply_timer_directive(timeouts: &TimeoutManager, id: &MachineId, directive: &fsm_engine::TimerDirective) {
    match directive {
        fsm_engine::TimerDirective::None => {}
        fsm_engine::TimerDirective::Cancel => {
            timeouts.cancel(id);
        }
        fsm_engine::TimerDirective::Arm { delay, armed_for_state, target_state } => {
            timeouts.schedule(id.clone(), *delay, armed_for_state.clone(), target_state.clone());
        }
    }
}
