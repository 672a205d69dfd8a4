use super::*;
use async_trait::async_trait;
use fsm_core::MachineId;
use fsm_storage::{MemoryTableStore, PartitionStrategy, RotatingPersistenceAdapter};
use parking_lot::Mutex as SyncMutex;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Serialize)]
struct DemoCtx {
    id: MachineId,
    state: String,
    last_change_ms: u64,
    complete: bool,
}

impl DemoCtx {
    fn new(id: &str) -> Self {
        Self { id: MachineId::new(id), state: "HUNGUP".to_string(), last_change_ms: 42, complete: true }
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

/// Wraps a real adapter and fails the first `fail_count` inserts with a
/// transient I/O error, to exercise `Archiver`'s retry loop.
struct FlakyAdapter<A> {
    inner: A,
    remaining_failures: AtomicUsize,
}

impl<A> FlakyAdapter<A> {
    fn new(inner: A, fail_count: usize) -> Self {
        Self { inner, remaining_failures: AtomicUsize::new(fail_count) }
    }
}

#[async_trait]
impl<P: PersistentContext, A: PersistenceAdapter<P>> PersistenceAdapter<P> for FlakyAdapter<A> {
    async fn insert(&self, entity: P, created_at_ms: u64) -> Result<(), PersistenceError> {
        if self.remaining_failures.load(Ordering::SeqCst) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::SeqCst);
            return Err(PersistenceError::Io("injected failure".to_string()));
        }
        self.inner.insert(entity, created_at_ms).await
    }
    async fn find_by_id(&self, id: &MachineId) -> Result<Option<P>, PersistenceError> {
        self.inner.find_by_id(id).await
    }
    async fn update_by_id(&self, entity: P) -> Result<(), PersistenceError> {
        self.inner.update_by_id(entity).await
    }
    async fn find_all_by_date_range(&self, since_ms: u64, until_ms: u64) -> Result<Vec<P>, PersistenceError> {
        self.inner.find_all_by_date_range(since_ms, until_ms).await
    }
    async fn delete_by_id(&self, id: &MachineId) -> Result<Option<P>, PersistenceError> {
        self.inner.delete_by_id(id).await
    }
}

fn active_store() -> RotatingPersistenceAdapter<DemoCtx, MemoryTableStore<DemoCtx>> {
    RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("active"))
}

#[tokio::test]
async fn archival_succeeds_after_transient_failures_without_invoking_the_callback() {
    let active = active_store();
    active.insert(DemoCtx::new("call-1"), 42).await.expect("seed active row");

    let destination = Arc::new(FlakyAdapter::new(active_store(), 2));
    let callback_calls = Arc::new(AtomicUsize::new(0));
    let callback_calls_clone = Arc::clone(&callback_calls);
    let archiver = Archiver::new(
        destination,
        ArchivePolicy { max_attempts: 5, initial_backoff: Duration::from_millis(1) },
        Arc::new(move |_id: &MachineId, _err: &PersistenceError| {
            callback_calls_clone.fetch_add(1, Ordering::SeqCst);
        }),
    );

    archiver.archive(&active, &MachineId::new("call-1")).await;

    assert_eq!(callback_calls.load(Ordering::SeqCst), 0);
    assert!(active.find_by_id(&MachineId::new("call-1")).await.expect("find").is_none());
}

#[tokio::test]
async fn archival_invokes_the_critical_failure_callback_exactly_once_after_exhausting_retries() {
    let active = active_store();
    active.insert(DemoCtx::new("call-1"), 42).await.expect("seed active row");

    let destination = Arc::new(FlakyAdapter::new(active_store(), usize::MAX / 2));
    let callback_calls = Arc::new(SyncMutex::new(Vec::new()));
    let callback_calls_clone = Arc::clone(&callback_calls);
    let archiver = Archiver::new(
        destination,
        ArchivePolicy { max_attempts: 3, initial_backoff: Duration::from_millis(1) },
        Arc::new(move |id: &MachineId, _err: &PersistenceError| {
            callback_calls_clone.lock().push(id.clone());
        }),
    );

    archiver.archive(&active, &MachineId::new("call-1")).await;

    assert_eq!(callback_calls.lock().len(), 1);
    // the row must still be present in `active` after permanent failure.
    assert!(active.find_by_id(&MachineId::new("call-1")).await.expect("find").is_some());
}
