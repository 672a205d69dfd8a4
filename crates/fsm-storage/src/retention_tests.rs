use super::*;
use crate::row::StoredRow;
use crate::table_store::MemoryTableStore;
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

#[tokio::test]
async fn prune_expired_drops_only_tables_past_retention() {
    let store: MemoryTableStore<DemoRow> = MemoryTableStore::new();
    store.ensure_table("p20260101").await.expect("ensure");
    store.ensure_table("p20260727").await.expect("ensure");
    store.insert(
        "p20260101",
        StoredRow::new(
            DemoRow { id: MachineId::new("old"), state: "X".to_string(), last_change_ms: 0, complete: false },
            0,
        ),
    )
    .await
    .expect("insert");

    let strategy = PartitionStrategy::multi_table_daily("p");
    let today = NaiveDate::from_ymd_opt(2026, 7, 28).expect("date");

    let dropped = prune_expired(&store, &strategy, today, 30).await.expect("prune");

    assert_eq!(dropped, vec!["p20260101".to_string()]);
    assert!(!store.table_exists("p20260101"));
    assert!(store.table_exists("p20260727"));
}

#[tokio::test]
async fn prune_expired_ignores_tables_outside_the_strategys_namespace() {
    let store: MemoryTableStore<DemoRow> = MemoryTableStore::new();
    store.ensure_table("history_call_1").await.expect("ensure");

    let strategy = PartitionStrategy::multi_table_daily("p");
    let today = NaiveDate::from_ymd_opt(2026, 7, 28).expect("date");

    let dropped = prune_expired(&store, &strategy, today, 0).await.expect("prune");

    assert!(dropped.is_empty());
    assert!(store.table_exists("history_call_1"));
}
