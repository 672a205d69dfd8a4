// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Wires the debug channel's [`QueryHandler`] seam to the call registry:
//! answers read-only queries directly off the active/history stores and
//! applies inbound `EVENT`/`EVENT_TO_ARBITRARY` commands through the
//! registry, re-broadcasting the resulting state change so every
//! connected debug client sees it (§4.7).

use crate::call::{CallContext, CallEvent};
use fsm_core::PersistentContext;
use fsm_debug::{
    DebugBroadcaster, EntryActionStatus, InboundCommand, InboundQuery, MachineSummary, OutboundFrame, QueryHandler,
};
use fsm_engine::DispatchOutcome;
use fsm_history::{grouping, table_name_for, HistoryStore, MemoryHistoryStore};
use fsm_registry::Registry;
use fsm_storage::{MemoryTableStore, PersistenceAdapter, RotatingPersistenceAdapter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub type CallActive = RotatingPersistenceAdapter<CallContext, MemoryTableStore<CallContext>>;
pub type CallRegistry = Registry<CallContext, crate::call::CallVolatile, CallEvent, CallActive, CallActive, fsm_core::SystemClock>;

pub struct DemoHandler {
    registry: CallRegistry,
    active: Arc<CallActive>,
    history_store: Arc<MemoryHistoryStore>,
    broadcaster: DebugBroadcaster,
}

impl DemoHandler {
    pub fn new(registry: CallRegistry, active: Arc<CallActive>, history_store: Arc<MemoryHistoryStore>, broadcaster: DebugBroadcaster) -> Self {
        Self { registry, active, history_store, broadcaster }
    }

    async fn machine_state_frame(&self, machine_id: fsm_core::MachineId) -> OutboundFrame {
        match self.active.find_by_id(&machine_id).await {
            Ok(Some(row)) => OutboundFrame::MachineState {
                machine_id: machine_id.into_string(),
                current_state: row.current_state().to_string(),
                context: serde_json::to_value(&row).unwrap_or(serde_json::Value::Null),
                timestamp: now_ms(),
            },
            Ok(None) => OutboundFrame::MachineState {
                machine_id: machine_id.into_string(),
                current_state: String::new(),
                context: serde_json::Value::Null,
                timestamp: now_ms(),
            },
            Err(error) => {
                tracing::warn!(%machine_id, %error, "debug query: failed to load machine state");
                OutboundFrame::MachineState {
                    machine_id: machine_id.into_string(),
                    current_state: String::new(),
                    context: serde_json::Value::Null,
                    timestamp: now_ms(),
                }
            }
        }
    }

    async fn apply_event(&self, machine_id: &str, event_type: &str, payload: serde_json::Value) {
        let Some(event) = CallEvent::from_wire(event_type) else {
            tracing::warn!(machine_id, event_type, "debug command named an unknown event type");
            return;
        };
        let id = fsm_core::MachineId::new(machine_id);
        let state_before = self.active.find_by_id(&id).await.ok().flatten().map(|row| row.current_state().to_string());

        match self.registry.route(&id, event).await {
            Ok(result) => {
                let state_after = match &result.outcome {
                    DispatchOutcome::Transitioned { to, .. } => to.clone(),
                    DispatchOutcome::Completed { final_state, .. } => final_state.clone(),
                    DispatchOutcome::StayedPut { state } | DispatchOutcome::Ignored { state, .. } => state.clone(),
                };
                let context = self
                    .active
                    .find_by_id(&id)
                    .await
                    .ok()
                    .flatten()
                    .and_then(|row| serde_json::to_value(&row).ok())
                    .unwrap_or(serde_json::Value::Null);
                self.broadcaster.publish(OutboundFrame::StateChange {
                    machine_id: machine_id.to_string(),
                    state_before: state_before.unwrap_or_default(),
                    state_after,
                    event_name: event_type.to_string(),
                    payload,
                    context,
                    timestamp: now_ms(),
                    entry_action_status: EntryActionStatus::Ok,
                });
            }
            Err(error) => {
                tracing::warn!(machine_id, event_type, %error, "debug command failed to route");
            }
        }
    }
}

#[async_trait::async_trait]
impl QueryHandler for DemoHandler {
    async fn handle_query(&self, query: InboundQuery) -> OutboundFrame {
        match query {
            InboundQuery::GetMachines | InboundQuery::GetRegistryState => {
                let rows = self.active.find_all_by_date_range(0, u64::MAX).await.unwrap_or_default();
                OutboundFrame::MachinesList {
                    machines: rows.into_iter().map(|row| MachineSummary { id: row.id().as_str().to_string(), machine_type: "call".to_string() }).collect(),
                }
            }
            InboundQuery::GetOfflineMachines => {
                let rows = self.active.find_all_by_date_range(0, u64::MAX).await.unwrap_or_default();
                OutboundFrame::MachinesList {
                    machines: rows
                        .into_iter()
                        .filter(|row| row.current_state() == "CONNECTED")
                        .map(|row| MachineSummary { id: row.id().as_str().to_string(), machine_type: "call".to_string() })
                        .collect(),
                }
            }
            InboundQuery::GetMachineState { machine_id } => self.machine_state_frame(fsm_core::MachineId::new(machine_id)).await,
            InboundQuery::GetHistory { machine_id } => {
                let id = fsm_core::MachineId::new(machine_id.clone());
                let raw_history = self.history_store.read_all(&table_name_for(&id)).await.unwrap_or_default();
                let history = grouping::read_grouped(self.history_store.as_ref(), &id).await.unwrap_or_default();
                OutboundFrame::HistoryData { machine_id, history, raw_history }
            }
            InboundQuery::GetHistorySince { machine_id, last_id } => {
                let id = fsm_core::MachineId::new(machine_id.clone());
                let new_entries = self.history_store.read_since(&table_name_for(&id), last_id).await.unwrap_or_default();
                OutboundFrame::HistoryUpdate { machine_id, last_id, new_entries }
            }
        }
    }

    async fn handle_command(&self, command: InboundCommand) {
        match command {
            InboundCommand::Event { machine_id, event_type, payload } | InboundCommand::EventToArbitrary { machine_id, event_type, payload } => {
                self.apply_event(&machine_id, &event_type, payload).await;
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
