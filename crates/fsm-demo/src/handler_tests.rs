use super::*;
use crate::call::{call_definition, CallContext};
use fsm_core::{EventTypeRegistry, SystemClock};
use fsm_debug::InboundQuery;
use fsm_registry::{ArchivePolicy, Archiver};
use fsm_storage::PartitionStrategy;
use std::time::Duration;

fn build_handler() -> DemoHandler {
    let active = Arc::new(RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("active")));
    let history_store = Arc::new(MemoryHistoryStore::new());
    let (history, _handle) = fsm_history::HistoryTracker::spawn(Arc::clone(&history_store));
    let completed = Arc::new(RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("completed")));
    let archiver = Archiver::new(
        completed,
        ArchivePolicy { max_attempts: 3, initial_backoff: Duration::from_millis(1) },
        Arc::new(|_id: &fsm_core::MachineId, _error: &fsm_core::PersistenceError| {}),
    );
    let registry = fsm_registry::Registry::new(
        call_definition().expect("well-formed call machine"),
        Arc::new(EventTypeRegistry::new()),
        Arc::clone(&active),
        history,
        archiver,
        SystemClock,
    );
    DemoHandler::new(registry, active, history_store, DebugBroadcaster::default())
}

#[tokio::test]
async fn get_machines_lists_a_registered_machine() {
    let handler = build_handler();
    handler.registry.register(CallContext::new("call-1")).await.expect("register");

    let reply = handler.handle_query(InboundQuery::GetMachines).await;
    match reply {
        OutboundFrame::MachinesList { machines } => {
            assert_eq!(machines.len(), 1);
            assert_eq!(machines[0].id, "call-1");
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn get_machine_state_reports_the_current_state() {
    let handler = build_handler();
    handler.registry.register(CallContext::new("call-1")).await.expect("register");

    let reply = handler.handle_query(InboundQuery::GetMachineState { machine_id: "call-1".into() }).await;
    match reply {
        OutboundFrame::MachineState { current_state, .. } => assert_eq!(current_state, "ADMISSION"),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn event_command_drives_the_machine_and_broadcasts_a_state_change() {
    let handler = build_handler();
    handler.registry.register(CallContext::new("call-1")).await.expect("register");
    let mut updates = handler.broadcaster.subscribe();

    handler
        .handle_command(InboundCommand::Event {
            machine_id: "call-1".into(),
            event_type: "INCOMING_CALL".into(),
            payload: serde_json::Value::Null,
        })
        .await;

    let frame = updates.recv().await.expect("broadcast frame");
    match frame {
        OutboundFrame::StateChange { state_before, state_after, .. } => {
            assert_eq!(state_before, "ADMISSION");
            assert_eq!(state_after, "RINGING");
        }
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn event_command_with_an_unknown_event_type_is_dropped_silently() {
    let handler = build_handler();
    handler.registry.register(CallContext::new("call-1")).await.expect("register");

    handler
        .handle_command(InboundCommand::Event {
            machine_id: "call-1".into(),
            event_type: "NOT_A_REAL_EVENT".into(),
            payload: serde_json::Value::Null,
        })
        .await;

    let reply = handler.handle_query(InboundQuery::GetMachineState { machine_id: "call-1".into() }).await;
    match reply {
        OutboundFrame::MachineState { current_state, .. } => assert_eq!(current_state, "ADMISSION"),
        other => panic!("unexpected reply: {other:?}"),
    }
}
