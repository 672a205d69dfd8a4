// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! History record shapes (§3, §6). Defined in `fsm-core` rather than
//! `fsm-history` so the engine can emit records without depending on the
//! history crate's storage/grouping machinery.

use crate::id::{MachineId, RunId};
use serde::{Deserialize, Serialize};

/// The kind of step a history record documents. Mirrors the synthesised
/// entries listed in §3/§4.2: initial entry, before/after entry/exit
/// actions, timeout arrival, completion, and error, plus the two ordinary
/// outcomes (transition, stay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryKind {
    InitialEntry,
    Transition,
    Stay,
    Ignored,
    BeforeExit,
    AfterExit,
    Entry,
    BeforeEntry,
    AfterEntry,
    TimeoutArrival,
    Completion,
    Rehydrated,
    ErrorEntry,
    ErrorExit,
    ErrorStay,
}

impl HistoryKind {
    pub fn is_error(&self) -> bool {
        matches!(self, HistoryKind::ErrorEntry | HistoryKind::ErrorExit | HistoryKind::ErrorStay)
    }
}

/// One append-only entry in a machine's history (§3, §6 history schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Monotonically increasing id, scoped to the machine.
    pub id: u64,
    /// Wall-clock timestamp at millisecond precision.
    pub datetime_ms: u64,
    /// Run id of the activation that produced this record.
    pub run_id: RunId,
    /// State the machine was in when the record was produced.
    pub state: String,
    /// Event name that triggered this record ("" for synthesised entries
    /// with no originating event, e.g. `InitialEntry`).
    pub event: String,
    pub kind: HistoryKind,
    pub event_ignored: bool,
    /// Base64-encoded JSON snapshot of the event payload.
    pub event_payload_b64: String,
    pub transition_or_stay: bool,
    /// Target state, present only for `Transition` records.
    pub transition_to_state: Option<String>,
    /// Per-state re-entry counter, incremented on each entry to a state.
    pub transition_counter: u64,
    /// Base64-encoded JSON snapshot of the persistent context.
    pub persistent_context_b64: String,
    /// Base64-encoded JSON snapshot of the volatile context.
    pub volatile_context_b64: String,
    /// Present only on `ErrorEntry`/`ErrorExit`/`ErrorStay` records.
    pub error_message: Option<String>,
}

/// A contiguous run of records sharing `(state, transition_counter)`,
/// produced by `readGrouped` (§4.5). If the run ended in a transition, a
/// synthesised `Transition` record is appended as `caused_transition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateInstance {
    pub state: String,
    pub transition_counter: u64,
    pub entries: Vec<HistoryRecord>,
    pub caused_transition: Option<HistoryRecord>,
}

/// The unique name of the machine's own history table, derived from
/// sanitising the machine id (§4.5, §6: `history_<sanitised_id>`).
pub fn history_table_name(id: &MachineId) -> String {
    format!("history_{}", sanitize_for_table_name(id.as_str()))
}

/// Replace any byte outside `[a-z0-9_]` with `_`, lower-casing ASCII
/// letters first. Keeps the result human-legible for short ids while
/// remaining a valid SQL identifier fragment for arbitrary machine ids.
fn sanitize_for_table_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_sanitises_punctuation() {
        let id = MachineId::new("call:+1-555-0100");
        assert_eq!(history_table_name(&id), "history_call__1_555_0100");
    }

    #[test]
    fn error_kind_detection() {
        assert!(HistoryKind::ErrorEntry.is_error());
        assert!(!HistoryKind::Transition.is_error());
    }
}
