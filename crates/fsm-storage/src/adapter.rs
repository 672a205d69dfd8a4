// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The persistence adapter surface (§4.4): `insert`, `findById`,
//! `updateById`, `findAllByDateRange`, plus `deleteById` for archival.
//! [`RotatingPersistenceAdapter`] is the one concrete implementation for
//! both deployment modes described in §9 — which table(s) a call touches
//! is entirely decided by its [`crate::partition::PartitionStrategy`].

use crate::partition::PartitionStrategy;
use crate::row::StoredRow;
use crate::table_store::TableStore;
use async_trait::async_trait;
use fsm_core::{MachineId, PersistenceError, PersistentContext};
use std::marker::PhantomData;

#[async_trait]
pub trait PersistenceAdapter<P: PersistentContext>: Send + Sync {
    async fn insert(&self, entity: P, created_at_ms: u64) -> Result<(), PersistenceError>;
    async fn find_by_id(&self, id: &MachineId) -> Result<Option<P>, PersistenceError>;
    async fn update_by_id(&self, entity: P) -> Result<(), PersistenceError>;
    async fn find_all_by_date_range(&self, since_ms: u64, until_ms: u64) -> Result<Vec<P>, PersistenceError>;
    async fn delete_by_id(&self, id: &MachineId) -> Result<Option<P>, PersistenceError>;
}

pub struct RotatingPersistenceAdapter<P, S> {
    store: S,
    strategy: PartitionStrategy,
    _marker: PhantomData<fn() -> P>,
}

impl<P, S> RotatingPersistenceAdapter<P, S> {
    pub fn new(store: S, strategy: PartitionStrategy) -> Self {
        Self { store, strategy, _marker: PhantomData }
    }
}

impl<P, S> RotatingPersistenceAdapter<P, S>
where
    P: PersistentContext,
    S: TableStore<P>,
{
    /// Find which table (if any) currently holds `id`. Partitioned mode
    /// has exactly one candidate table; multi-table mode has no id→table
    /// index, so every table this strategy owns is searched — a missing
    /// table along the way is a soft miss (§4.4), not an error.
    async fn locate(&self, id: &MachineId) -> Result<Option<(String, StoredRow<P>)>, PersistenceError> {
        let candidates: Vec<String> = match &self.strategy {
            PartitionStrategy::Partitioned { table_name } => vec![table_name.clone()],
            PartitionStrategy::MultiTable { .. } => {
                let mut tables: Vec<String> =
                    self.store.all_tables().into_iter().filter(|t| self.strategy.owns_table(t)).collect();
                tables.sort_unstable();
                tables.reverse();
                tables
            }
        };

        for table in candidates {
            if !self.store.table_exists(&table) {
                continue;
            }
            if let Some(row) = self.store.find(&table, id).await? {
                return Ok(Some((table, row)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<P, S> PersistenceAdapter<P> for RotatingPersistenceAdapter<P, S>
where
    P: PersistentContext,
    S: TableStore<P>,
{
    async fn insert(&self, entity: P, created_at_ms: u64) -> Result<(), PersistenceError> {
        let table = self.strategy.table_for(created_at_ms);
        self.store.ensure_table(&table).await?;
        self.store.insert(&table, StoredRow::new(entity, created_at_ms)).await
    }

    async fn find_by_id(&self, id: &MachineId) -> Result<Option<P>, PersistenceError> {
        Ok(self.locate(id).await?.map(|(_, row)| row.entity))
    }

    async fn update_by_id(&self, entity: P) -> Result<(), PersistenceError> {
        let id = entity.id().clone();
        let Some((table, existing)) = self.locate(&id).await? else {
            return Err(PersistenceError::NotFound { id: id.into_string() });
        };
        self.store.update(&table, StoredRow::new(entity, existing.created_at_ms)).await
    }

    async fn find_all_by_date_range(&self, since_ms: u64, until_ms: u64) -> Result<Vec<P>, PersistenceError> {
        let mut out = Vec::new();
        for table in self.strategy.tables_for_range(since_ms, until_ms) {
            if !self.store.table_exists(&table) {
                continue;
            }
            let rows = self.store.scan_date_range(&table, since_ms, until_ms).await?;
            out.extend(rows.into_iter().map(|row| row.entity));
        }
        Ok(out)
    }

    async fn delete_by_id(&self, id: &MachineId) -> Result<Option<P>, PersistenceError> {
        let Some((table, _)) = self.locate(id).await? else { return Ok(None) };
        Ok(self.store.delete(&table, id).await?.map(|row| row.entity))
    }
}

/// Move one row from the active store to the history store, atomically
/// from the caller's point of view: the history insert must succeed
/// before the active row is deleted, and on any failure the machine
/// remains in the active store (§6 archival atomicity). A real SQL
/// backend would wrap both statements in one transaction; across two
/// independent in-memory stores the best this helper can offer is
/// ordering, which is why the insert-then-delete order matters here.
pub async fn archive_row<P, A, H>(active: &A, history: &H, id: &MachineId) -> Result<(), PersistenceError>
where
    P: PersistentContext,
    A: PersistenceAdapter<P>,
    H: PersistenceAdapter<P>,
{
    let Some(entity) = active.find_by_id(id).await? else {
        return Err(PersistenceError::NotFound { id: id.as_str().to_string() });
    };
    let created_at_ms = entity.last_state_change_ms();
    history.insert(entity.deep_copy(), created_at_ms).await?;
    active.delete_by_id(id).await?;
    Ok(())
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
