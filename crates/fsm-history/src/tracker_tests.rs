use super::*;
use crate::record_store::MemoryHistoryStore;
use fsm_core::{HistoryKind, RunId};
use std::time::Duration;

fn record(id: u64, state: &str) -> HistoryRecord {
    HistoryRecord {
        id,
        datetime_ms: id,
        run_id: RunId::generate(),
        state: state.to_string(),
        event: "go".to_string(),
        kind: HistoryKind::Transition,
        event_ignored: false,
        event_payload_b64: String::new(),
        transition_or_stay: true,
        transition_to_state: Some("NEXT".to_string()),
        transition_counter: 0,
        persistent_context_b64: String::new(),
        volatile_context_b64: String::new(),
        error_message: None,
    }
}

async fn wait_for_rows(store: &MemoryHistoryStore, table: &str, count: usize) -> Vec<HistoryRecord> {
    for _ in 0..200 {
        let rows = store.read_all(table).await.expect("read");
        if rows.len() >= count {
            return rows;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    store.read_all(table).await.expect("read")
}

#[tokio::test]
async fn recorded_events_land_in_the_machines_own_table() {
    let store = Arc::new(MemoryHistoryStore::new());
    let (tracker, _handle) = HistoryTracker::spawn(Arc::clone(&store));

    let id = MachineId::new("call-1");
    tracker.record(id.clone(), record(1, "RINGING")).expect("enqueue");
    tracker.record(id.clone(), record(2, "CONNECTED")).expect("enqueue");

    let rows = wait_for_rows(&store, "history_call_1", 2).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].state, "RINGING");
    assert_eq!(rows[1].state, "CONNECTED");
}

#[tokio::test]
async fn dropping_every_handle_lets_the_worker_drain_and_exit() {
    let store = Arc::new(MemoryHistoryStore::new());
    let (tracker, handle) = HistoryTracker::spawn(Arc::clone(&store));

    tracker.record(MachineId::new("call-1"), record(1, "RINGING")).expect("enqueue");
    drop(tracker);

    tokio::time::timeout(Duration::from_secs(1), handle).await.expect("worker exits promptly").expect("no panic");
}
