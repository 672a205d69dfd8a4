// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! JSON frame shapes for the debug channel (§6). The channel itself
//! (WebSocket accept loop, browser UI) is out of scope; this crate
//! specifies the wire contract an external transport would carry, the
//! same way the teacher's `crates/daemon/src/protocol` specifies IPC
//! frames independent of which socket kind actually carries them.
//!
//! Inbound frames arrive tagged on two different keys depending on
//! whether they're a read-only query (`action`) or a command that
//! mutates a machine (`type`); [`InboundFrame`] dispatches between the
//! two untagged.

use fsm_core::{HistoryRecord, StateInstance};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum InboundQuery {
    GetMachines,
    GetMachineState { machine_id: String },
    GetHistory { machine_id: String },
    GetHistorySince { machine_id: String, last_id: u64 },
    GetOfflineMachines,
    GetRegistryState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum InboundCommand {
    Event { machine_id: String, event_type: String, payload: Value },
    EventToArbitrary { machine_id: String, event_type: String, payload: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InboundFrame {
    Query(InboundQuery),
    Command(InboundCommand),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MachineSummary {
    pub id: String,
    pub machine_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum OutboundFrame {
    MachinesList {
        machines: Vec<MachineSummary>,
    },
    MachineState {
        machine_id: String,
        current_state: String,
        context: Value,
        timestamp: u64,
    },
    HistoryData {
        machine_id: String,
        history: Vec<StateInstance>,
        raw_history: Vec<HistoryRecord>,
    },
    HistoryUpdate {
        machine_id: String,
        last_id: u64,
        new_entries: Vec<HistoryRecord>,
    },
    StateChange {
        machine_id: String,
        state_before: String,
        state_after: String,
        event_name: String,
        payload: Value,
        context: Value,
        timestamp: u64,
        entry_action_status: EntryActionStatus,
    },
    MachineRegistered {
        machine_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        machine_type: Option<String>,
    },
    MachineUnregistered {
        machine_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        machine_type: Option<String>,
    },
    CompleteStatus {
        machines: Vec<MachineSummary>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryActionStatus {
    Ok,
    Error,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
