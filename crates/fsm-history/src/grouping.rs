// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! `readGrouped` (§4.5): group a machine's flat history into contiguous
//! `StateInstance` runs sharing `(state, transition_counter)`.

use crate::record_store::{table_name_for, HistoryStore};
use fsm_core::{HistoryKind, HistoryRecord, MachineId, PersistenceError, StateInstance};

pub async fn read_grouped<S: HistoryStore + ?Sized>(
    store: &S,
    id: &MachineId,
) -> Result<Vec<StateInstance>, PersistenceError> {
    let table = table_name_for(id);
    let records = store.read_all(&table).await?;
    Ok(group(&records))
}

/// A `Transition` record marks the end of the run it's attached to, not
/// the start of the next one — it becomes that run's `caused_transition`
/// rather than an entry of the state it's heading towards.
fn group(records: &[HistoryRecord]) -> Vec<StateInstance> {
    let mut groups: Vec<StateInstance> = Vec::new();

    for record in records {
        if record.kind == HistoryKind::Transition {
            if let Some(last) = groups.last_mut() {
                last.caused_transition = Some(record.clone());
            }
            continue;
        }

        match groups.last_mut() {
            Some(last) if last.state == record.state && last.transition_counter == record.transition_counter => {
                last.entries.push(record.clone());
            }
            _ => groups.push(StateInstance {
                state: record.state.clone(),
                transition_counter: record.transition_counter,
                entries: vec![record.clone()],
                caused_transition: None,
            }),
        }
    }

    groups
}

#[cfg(test)]
#[path = "grouping_tests.rs"]
mod tests;
