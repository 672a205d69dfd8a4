use super::*;
use fsm_core::MachineId;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct DemoRow {
    id: MachineId,
    state: String,
    last_change_ms: u64,
    complete: bool,
}

impl PersistentContext for DemoRow {
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

fn row(id: &str, created_at_ms: u64) -> StoredRow<DemoRow> {
    StoredRow::new(
        DemoRow { id: MachineId::new(id), state: "RINGING".to_string(), last_change_ms: created_at_ms, complete: false },
        created_at_ms,
    )
}

#[tokio::test]
async fn insert_then_find_round_trips() {
    let store = MemoryTableStore::new();
    store.ensure_table("active").await.expect("ensure");
    store.insert("active", row("m1", 1_000)).await.expect("insert");

    let found = store.find("active", &MachineId::new("m1")).await.expect("find").expect("present");
    assert_eq!(found.entity.id, MachineId::new("m1"));
    assert_eq!(found.created_at_ms, 1_000);
}

#[tokio::test]
async fn find_in_missing_table_is_a_soft_miss() {
    let store: MemoryTableStore<DemoRow> = MemoryTableStore::new();
    let found = store.find("nope", &MachineId::new("m1")).await.expect("no error");
    assert!(found.is_none());
}

#[tokio::test]
async fn update_requires_an_existing_row() {
    let store = MemoryTableStore::new();
    store.ensure_table("active").await.expect("ensure");
    let err = store.update("active", row("m1", 1_000)).await.unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound { .. }));
}

#[tokio::test]
async fn delete_removes_and_returns_the_row() {
    let store = MemoryTableStore::new();
    store.ensure_table("active").await.expect("ensure");
    store.insert("active", row("m1", 1_000)).await.expect("insert");

    let deleted = store.delete("active", &MachineId::new("m1")).await.expect("delete").expect("was present");
    assert_eq!(deleted.entity.id, MachineId::new("m1"));
    assert!(store.find("active", &MachineId::new("m1")).await.expect("find").is_none());
}

#[tokio::test]
async fn scan_date_range_filters_by_created_at() {
    let store = MemoryTableStore::new();
    store.ensure_table("active").await.expect("ensure");
    store.insert("active", row("early", 1_000)).await.expect("insert");
    store.insert("active", row("late", 9_000)).await.expect("insert");

    let rows = store.scan_date_range("active", 0, 5_000).await.expect("scan");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entity.id, MachineId::new("early"));
}
