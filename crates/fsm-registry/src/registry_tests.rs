use super::*;
use crate::archive::{ArchivePolicy, Archiver};
use fsm_core::{FakeClock, MachineId, PersistenceError};
use fsm_engine::{DispatchOutcome, MachineDefinitionBuilder};
use fsm_history::MemoryHistoryStore;
use fsm_storage::{MemoryTableStore, PartitionStrategy, RotatingPersistenceAdapter};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
struct DemoCtx {
    id: MachineId,
    state: String,
    last_change_ms: u64,
    complete: bool,
}

impl DemoCtx {
    fn new(id: &str) -> Self {
        Self { id: MachineId::new(id), state: String::new(), last_change_ms: 0, complete: false }
    }
}

impl PersistentContext for DemoCtx {
    fn id(&self) -> &MachineId {
        &self.id
    }
    fn current_state(&self) -> &str {
        &self.state
    }
    fn set_current_state(&mut self, state: &str) {
        self.state = state.to_string();
    }
    fn last_state_change_ms(&self) -> u64 {
        self.last_change_ms
    }
    fn set_last_state_change_ms(&mut self, ms: u64) {
        self.last_change_ms = ms;
    }
    fn complete(&self) -> bool {
        self.complete
    }
    fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }
}

struct DemoVolatile;
impl VolatileContext<DemoCtx> for DemoVolatile {
    fn rehydrate(_persistent: &DemoCtx) -> Self {
        DemoVolatile
    }
}

#[derive(Clone)]
enum DemoEvent {
    Go,
}
impl MachineEvent for DemoEvent {
    fn discriminant(&self) -> &'static str {
        "go"
    }
    fn payload_json(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

type DemoActive = RotatingPersistenceAdapter<DemoCtx, MemoryTableStore<DemoCtx>>;
type DemoRegistry = Registry<DemoCtx, DemoVolatile, DemoEvent, DemoActive, DemoActive, FakeClock>;

fn call_definition() -> Arc<MachineDefinition<DemoCtx, DemoVolatile, DemoEvent>> {
    Arc::new(
        MachineDefinitionBuilder::new("RINGING")
            .state("RINGING", |s| s.transition("go", "CONNECTED").timeout(Duration::from_secs(30), "HUNGUP"))
            .state("CONNECTED", |s| s.transition("go", "HUNGUP"))
            .state("HUNGUP", |s| s.final_state())
            .build()
            .expect("well-formed demo machine"),
    )
}

fn build_registry() -> DemoRegistry {
    let active = Arc::new(RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("active")));
    let (history, _handle) = HistoryTracker::spawn(Arc::new(MemoryHistoryStore::new()));
    let completed = Arc::new(RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("completed")));
    let archiver = Archiver::new(
        completed,
        ArchivePolicy { max_attempts: 3, initial_backoff: Duration::from_millis(1) },
        Arc::new(|id: &MachineId, error: &PersistenceError| {
            tracing::error!(%id, %error, "test archival callback fired");
        }),
    );
    Registry::new(call_definition(), Arc::new(fsm_core::EventTypeRegistry::new()), active, history, archiver, FakeClock::new())
}

#[tokio::test]
async fn register_then_route_transitions_the_machine() {
    let registry = build_registry();
    let id = registry.register(DemoCtx::new("call-1")).await.expect("register");

    let result = registry.route(&id, DemoEvent::Go).await.expect("route");
    assert_eq!(result.outcome, DispatchOutcome::Transitioned { from: "RINGING".to_string(), to: "CONNECTED".to_string() });
}

#[tokio::test]
async fn routing_to_an_unknown_machine_fails() {
    let registry = build_registry();
    let err = registry.route(&MachineId::new("ghost"), DemoEvent::Go).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnknownMachine(_)));
}

#[tokio::test]
async fn eviction_and_rehydration_preserve_current_state() {
    let registry = build_registry();
    let id = registry.register(DemoCtx::new("call-1")).await.expect("register");
    registry.route(&id, DemoEvent::Go).await.expect("route");
    assert!(registry.is_live(&id));

    registry.evict(&id);
    assert!(!registry.is_live(&id));

    let result = registry.route(&id, DemoEvent::Go).await.expect("route after rehydration");
    assert_eq!(result.outcome, DispatchOutcome::Completed { from: "CONNECTED".to_string(), final_state: "HUNGUP".to_string() });
}

#[tokio::test]
async fn a_completed_machine_is_archived_out_of_the_active_store() {
    let registry = build_registry();
    let id = registry.register(DemoCtx::new("call-1")).await.expect("register");
    registry.route(&id, DemoEvent::Go).await.expect("route to CONNECTED");
    let result = registry.route(&id, DemoEvent::Go).await.expect("route to HUNGUP");
    assert_eq!(result.outcome, DispatchOutcome::Completed { from: "CONNECTED".to_string(), final_state: "HUNGUP".to_string() });

    // give the mailbox task a beat to finish its post-reply archival work.
    tokio::task::yield_now().await;
    assert!(registry.active.find_by_id(&id).await.expect("find").is_none());

    let err = registry.route(&id, DemoEvent::Go).await.unwrap_err();
    assert!(matches!(err, RegistryError::UnknownMachine(_)));
}

#[tokio::test]
async fn startup_scan_archives_rows_left_complete_from_a_prior_run() {
    let registry = build_registry();
    let mut row = DemoCtx::new("call-1");
    row.set_current_state("HUNGUP");
    row.set_complete(true);
    registry.active.insert(row, 0).await.expect("seed a completed row directly");

    let archived = registry.startup_scan(u64::MAX).await.expect("startup scan");
    assert_eq!(archived, 1);
    assert!(registry.active.find_by_id(&MachineId::new("call-1")).await.expect("find").is_none());
}
