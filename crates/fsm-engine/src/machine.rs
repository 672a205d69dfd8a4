// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Machine instances and the dispatch algorithm (§3, §4.2).

use crate::action::run_entry_exit;
use crate::definition::{MachineDefinition, Transition};
use crate::dispatch_outcome::{DispatchOutcome, IgnoredReason, TimerDirective};
use base64::Engine as _;
use fsm_core::{
    EventTypeRegistry, HistoryKind, HistoryRecord, MachineEvent, MachineId, PersistentContext,
    RunId, VolatileContext, TIMEOUT_EVENT_TYPE,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A definition + id + both contexts + current state + run id (§3).
///
/// `history_id_seq` is local per-activation bookkeeping: the registry is
/// responsible for assigning globally-monotonic ids when it persists
/// records returned from `dispatch`, since this struct has no storage
/// access. The ids produced here are dense and ordered *within* one
/// `MachineInstance`'s lifetime, which is all the engine itself needs.
pub struct MachineInstance<P, V, E> {
    definition: Arc<MachineDefinition<P, V, E>>,
    event_types: Arc<EventTypeRegistry>,
    persistent: P,
    volatile: V,
    run_id: RunId,
    reentry_counters: HashMap<String, u64>,
    next_history_id: u64,
    /// Timestamp of the dispatch call currently producing records; distinct
    /// from `last_state_change_ms` on the persistent context, which only
    /// moves forward on an actual transition (stay/ignored records still
    /// need the real wall-clock time they were produced at).
    now_ms: u64,
}

/// Bundled result of one `dispatch` call.
pub struct DispatchResult {
    pub outcome: DispatchOutcome,
    pub records: Vec<HistoryRecord>,
    pub timer_directive: TimerDirective,
}

impl<P, V, E> MachineInstance<P, V, E>
where
    P: PersistentContext,
    V: VolatileContext<P>,
    E: MachineEvent,
{
    /// Activate a brand-new machine: assigns a run id, records the initial
    /// entry, runs the initial state's `on_entry`, and reports whether a
    /// timeout should be armed (§3 "Lifecycles").
    pub fn activate_new(
        definition: Arc<MachineDefinition<P, V, E>>,
        event_types: Arc<EventTypeRegistry>,
        mut persistent: P,
        now_ms: u64,
    ) -> (Self, Vec<HistoryRecord>, TimerDirective) {
        let initial = definition.initial_state().to_string();
        persistent.set_current_state(&initial);
        persistent.set_last_state_change_ms(now_ms);
        let volatile = V::rehydrate(&persistent);
        let mut machine = Self {
            definition,
            event_types,
            persistent,
            volatile,
            run_id: RunId::generate(),
            reentry_counters: HashMap::new(),
            next_history_id: 1,
            now_ms,
        };
        let (records, directive) = machine.enter_state(&initial, HistoryKind::InitialEntry);
        (machine, records, directive)
    }

    /// Activate a machine rehydrated from storage: persistent context was
    /// loaded from the store, volatile context is reconstructed via the
    /// factory, and a fresh run id is assigned (§4.6, round-trip law).
    pub fn activate_rehydrated(
        definition: Arc<MachineDefinition<P, V, E>>,
        event_types: Arc<EventTypeRegistry>,
        persistent: P,
        now_ms: u64,
    ) -> (Self, Vec<HistoryRecord>, TimerDirective) {
        let volatile = V::rehydrate(&persistent);
        let current_state = persistent.current_state().to_string();
        let mut machine = Self {
            definition,
            event_types,
            persistent,
            volatile,
            run_id: RunId::generate(),
            reentry_counters: HashMap::new(),
            next_history_id: 1,
            now_ms,
        };
        let record = machine.record(&current_state, "", HistoryKind::Rehydrated, false, &serde_json::Value::Null, false, None);
        let directive = machine.timer_directive_for_state(&current_state);
        (machine, vec![record], directive)
    }

    pub fn id(&self) -> &MachineId {
        self.persistent.id()
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn current_state(&self) -> &str {
        self.persistent.current_state()
    }

    pub fn persistent(&self) -> &P {
        &self.persistent
    }

    pub fn volatile(&self) -> &V {
        &self.volatile
    }

    pub fn is_complete(&self) -> bool {
        self.persistent.complete()
    }

    pub fn reentry_count(&self, state: &str) -> u64 {
        self.reentry_counters.get(state).copied().unwrap_or(0)
    }

    /// Run the dispatch algorithm for `event` (§4.2 steps 1–4g).
    pub fn dispatch(&mut self, event: &E, now_ms: u64) -> DispatchResult {
        self.now_ms = now_ms;
        let state_name = self.current_state().to_string();
        let event_type = self.event_types.event_type(event);
        let payload = event.payload_json();

        if self.definition.is_final_state(&state_name) {
            let record = self.record(&state_name, &event_type, HistoryKind::Ignored, true, &payload, false, None);
            return DispatchResult {
                outcome: DispatchOutcome::Ignored { state: state_name, reason: IgnoredReason::FinalState },
                records: vec![record],
                timer_directive: TimerDirective::None,
            };
        }

        // Single lookup, reused for both the stay and transition paths
        // below — no re-fetching the same state back out of the
        // definition under an `.expect()`.
        let definition = Arc::clone(&self.definition);
        let Some(state_def) = definition.state(&state_name) else {
            // Build() validates every declared transition's source state
            // exists, so this is unreachable in practice; handled the
            // same as an unmapped event rather than panicking.
            let record = self.record(&state_name, &event_type, HistoryKind::Ignored, true, &payload, false, None);
            return DispatchResult {
                outcome: DispatchOutcome::Ignored { state: state_name, reason: IgnoredReason::NoTransition },
                records: vec![record],
                timer_directive: TimerDirective::None,
            };
        };

        let Some(transition) = state_def.transitions.get(&event_type) else {
            let record = self.record(&state_name, &event_type, HistoryKind::Ignored, true, &payload, false, None);
            return DispatchResult {
                outcome: DispatchOutcome::Ignored { state: state_name, reason: IgnoredReason::NoTransition },
                records: vec![record],
                timer_directive: TimerDirective::None,
            };
        };

        let target = match transition {
            Transition::Stay(handler) => {
                let result = handler(&mut self.persistent, &mut self.volatile, event);
                let record = match result {
                    Ok(()) => self.record(&state_name, &event_type, HistoryKind::Stay, false, &payload, false, None),
                    Err(e) => {
                        let mut record = self.record(&state_name, &event_type, HistoryKind::ErrorStay, false, &payload, false, None);
                        record.error_message = Some(e.message);
                        record
                    }
                };
                return DispatchResult {
                    outcome: DispatchOutcome::StayedPut { state: state_name },
                    records: vec![record],
                    // Stay handlers never cancel the pending timeout (§4.2 step 3, §5).
                    timer_directive: TimerDirective::None,
                };
            }
            Transition::To(target) => target.clone(),
        };

        let mut records = Vec::new();

        // 4a: cancel pending timeout (caller arms/cancels via the returned directive).
        // 4b: run on_exit, off the `state_def` already in hand.
        if let Some(result) = run_entry_exit(&state_def.on_exit, &mut self.persistent, &mut self.volatile) {
            match result {
                Ok(()) => {
                    records.push(self.record(&state_name, &event_type, HistoryKind::BeforeExit, false, &payload, false, None));
                    records.push(self.record(&state_name, &event_type, HistoryKind::AfterExit, false, &payload, false, None));
                }
                Err(e) => {
                    let mut record = self.record(&state_name, &event_type, HistoryKind::ErrorExit, false, &payload, false, None);
                    record.error_message = Some(e.message);
                    records.push(record);
                }
            }
        }

        // 4c: commit the state write before running entry actions — side
        // effects in actions must be idempotent, since this write is never
        // rolled back on action failure (§4.2 "Action failure").
        self.persistent.set_current_state(&target);
        self.persistent.set_last_state_change_ms(now_ms);
        let counter = self.reentry_counters.entry(target.clone()).or_insert(0);
        *counter += 1;
        let reentry_counter = *counter;

        // 4d: record the outbound transition.
        records.push(self.record(&state_name, &event_type, HistoryKind::Transition, false, &payload, true, Some(target.clone())));

        // 4e: run on_entry. Builder validates every transition target
        // exists, so `definition.state(&target)` is always `Some` here;
        // a missing entry is treated as "no on_entry configured" rather
        // than panicking.
        match definition.state(&target).and_then(|d| run_entry_exit(&d.on_entry, &mut self.persistent, &mut self.volatile)) {
            None => {
                records.push(self.record_with_counter(&target, &event_type, HistoryKind::Entry, false, &payload, false, None, reentry_counter));
            }
            Some(Ok(())) => {
                records.push(self.record_with_counter(&target, &event_type, HistoryKind::BeforeEntry, false, &payload, false, None, reentry_counter));
                records.push(self.record_with_counter(&target, &event_type, HistoryKind::AfterEntry, false, &payload, false, None, reentry_counter));
            }
            Some(Err(e)) => {
                let mut record = self.record_with_counter(&target, &event_type, HistoryKind::ErrorEntry, false, &payload, false, None, reentry_counter);
                record.error_message = Some(e.message);
                records.push(record);
            }
        }

        // 4f/4g: completion or re-arm, decided from the state already
        // committed in 4c regardless of whether the entry action errored.
        if self.definition.is_final_state(&target) {
            self.persistent.set_complete(true);
            records.push(self.record_with_counter(&target, &event_type, HistoryKind::Completion, false, &payload, false, None, reentry_counter));
            DispatchResult {
                outcome: DispatchOutcome::Completed { from: state_name, final_state: target },
                records,
                timer_directive: TimerDirective::Cancel,
            }
        } else {
            let directive = self.timer_directive_for_state(&target);
            DispatchResult {
                outcome: DispatchOutcome::Transitioned { from: state_name, to: target },
                records,
                timer_directive: directive,
            }
        }
    }

    /// Deliver the synthesised `TIMEOUT` event: dispatches exactly like any
    /// other event, but the engine fabricates the event name/payload
    /// rather than taking them from a caller-supplied `E` (§4.2).
    pub fn dispatch_timeout(&mut self, target: &str, now_ms: u64) -> DispatchResult {
        self.now_ms = now_ms;
        // The spec requires the timeout's *effect* to be the declared
        // target transition; we drive that directly instead of routing
        // through the event table, since `TIMEOUT` is not a table entry.
        let state_name = self.current_state().to_string();
        let mut records = vec![self.record(&state_name, TIMEOUT_EVENT_TYPE, HistoryKind::TimeoutArrival, false, &serde_json::Value::Null, true, Some(target.to_string()))];

        self.persistent.set_current_state(target);
        self.persistent.set_last_state_change_ms(now_ms);
        let counter = self.reentry_counters.entry(target.to_string()).or_insert(0);
        *counter += 1;
        let reentry_counter = *counter;

        // Builder validates every declared timeout target exists, so this
        // is always `Some`; a missing definition is treated as "no
        // on_entry configured" rather than panicking.
        let entry_result = {
            let definition = Arc::clone(&self.definition);
            definition.state(target).and_then(|d| run_entry_exit(&d.on_entry, &mut self.persistent, &mut self.volatile))
        };
        match entry_result {
            None => records.push(self.record_with_counter(target, TIMEOUT_EVENT_TYPE, HistoryKind::Entry, false, &serde_json::Value::Null, false, None, reentry_counter)),
            Some(Ok(())) => {
                records.push(self.record_with_counter(target, TIMEOUT_EVENT_TYPE, HistoryKind::BeforeEntry, false, &serde_json::Value::Null, false, None, reentry_counter));
                records.push(self.record_with_counter(target, TIMEOUT_EVENT_TYPE, HistoryKind::AfterEntry, false, &serde_json::Value::Null, false, None, reentry_counter));
            }
            Some(Err(e)) => {
                let mut record = self.record_with_counter(target, TIMEOUT_EVENT_TYPE, HistoryKind::ErrorEntry, false, &serde_json::Value::Null, false, None, reentry_counter);
                record.error_message = Some(e.message);
                records.push(record);
            }
        }

        if self.definition.is_final_state(target) {
            self.persistent.set_complete(true);
            records.push(self.record_with_counter(target, TIMEOUT_EVENT_TYPE, HistoryKind::Completion, false, &serde_json::Value::Null, false, None, reentry_counter));
            DispatchResult {
                outcome: DispatchOutcome::Completed { from: state_name, final_state: target.to_string() },
                records,
                timer_directive: TimerDirective::Cancel,
            }
        } else {
            let directive = self.timer_directive_for_state(target);
            DispatchResult {
                outcome: DispatchOutcome::Transitioned { from: state_name, to: target.to_string() },
                records,
                timer_directive: directive,
            }
        }
    }

    fn enter_state(&mut self, state: &str, kind: HistoryKind) -> (Vec<HistoryRecord>, TimerDirective) {
        let counter = self.reentry_counters.entry(state.to_string()).or_insert(0);
        *counter += 1;
        let reentry_counter = *counter;
        let mut records = Vec::new();

        // Builder validates the initial state and every transition target
        // exist, so this is always `Some`; a missing definition is
        // treated as "no on_entry configured" rather than panicking.
        let entry_result = {
            let definition = Arc::clone(&self.definition);
            definition.state(state).and_then(|d| run_entry_exit(&d.on_entry, &mut self.persistent, &mut self.volatile))
        };
        match entry_result {
            None => records.push(self.record_with_counter(state, "", kind, false, &serde_json::Value::Null, false, None, reentry_counter)),
            Some(Ok(())) => {
                records.push(self.record_with_counter(state, "", HistoryKind::BeforeEntry, false, &serde_json::Value::Null, false, None, reentry_counter));
                records.push(self.record_with_counter(state, "", HistoryKind::AfterEntry, false, &serde_json::Value::Null, false, None, reentry_counter));
            }
            Some(Err(e)) => {
                let mut record = self.record_with_counter(state, "", HistoryKind::ErrorEntry, false, &serde_json::Value::Null, false, None, reentry_counter);
                record.error_message = Some(e.message);
                records.push(record);
            }
        }

        if self.definition.is_final_state(state) {
            self.persistent.set_complete(true);
            (records, TimerDirective::Cancel)
        } else {
            let directive = self.timer_directive_for_state(state);
            (records, directive)
        }
    }

    fn timer_directive_for_state(&self, state: &str) -> TimerDirective {
        match self.definition.state(state).and_then(|s| s.timeout.clone()) {
            Some((delay, target)) => TimerDirective::Arm { delay, armed_for_state: state.to_string(), target_state: target },
            None => TimerDirective::Cancel,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &mut self,
        state: &str,
        event: &str,
        kind: HistoryKind,
        ignored: bool,
        payload: &serde_json::Value,
        transition_or_stay: bool,
        target: Option<String>,
    ) -> HistoryRecord {
        let counter = self.reentry_counters.get(state).copied().unwrap_or(0);
        self.record_with_counter(state, event, kind, ignored, payload, transition_or_stay, target, counter)
    }

    #[allow(clippy::too_many_arguments)]
    fn record_with_counter(
        &mut self,
        state: &str,
        event: &str,
        kind: HistoryKind,
        ignored: bool,
        payload: &serde_json::Value,
        transition_or_stay: bool,
        target: Option<String>,
        transition_counter: u64,
    ) -> HistoryRecord {
        let id = self.next_history_id;
        self.next_history_id += 1;
        let b64 = base64::engine::general_purpose::STANDARD;
        HistoryRecord {
            id,
            datetime_ms: self.now_ms,
            run_id: self.run_id.clone(),
            state: state.to_string(),
            event: event.to_string(),
            kind,
            event_ignored: ignored,
            event_payload_b64: b64.encode(serde_json::to_vec(payload).unwrap_or_default()),
            transition_or_stay,
            transition_to_state: target,
            transition_counter,
            persistent_context_b64: b64.encode(serde_json::to_vec(&self.persistent.deep_copy()).unwrap_or_default()),
            volatile_context_b64: b64.encode(serde_json::to_vec(&self.volatile.snapshot()).unwrap_or_default()),
            error_message: None,
        }
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
