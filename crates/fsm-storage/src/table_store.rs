// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The storage backend contract (§4.4), modelled one level below
//! [`crate::adapter::PersistenceAdapter`]: a `TableStore` knows nothing
//! about partitioning or date ranges, only how to keep one named table of
//! rows keyed by machine id. `MemoryTableStore` is a real, usable backend
//! (the demo binary runs on it), not a test-only fake — durable backends
//! (Postgres, SQLite, ...) would implement the same trait.

use crate::row::StoredRow;
use async_trait::async_trait;
use fsm_core::{MachineId, PersistenceError, PersistentContext};
use parking_lot::Mutex;
use std::collections::HashMap;

#[async_trait]
pub trait TableStore<P: PersistentContext>: Send + Sync {
    /// Create `table` if it does not already exist. Idempotent.
    async fn ensure_table(&self, table: &str) -> Result<(), PersistenceError>;

    async fn insert(&self, table: &str, row: StoredRow<P>) -> Result<(), PersistenceError>;

    async fn update(&self, table: &str, row: StoredRow<P>) -> Result<(), PersistenceError>;

    async fn find(&self, table: &str, id: &MachineId) -> Result<Option<StoredRow<P>>, PersistenceError>;

    async fn delete(&self, table: &str, id: &MachineId) -> Result<Option<StoredRow<P>>, PersistenceError>;

    async fn scan_date_range(
        &self,
        table: &str,
        since_ms: u64,
        until_ms: u64,
    ) -> Result<Vec<StoredRow<P>>, PersistenceError>;

    /// Whether `table` has been created. A caller querying a table that
    /// does not exist treats that as a soft miss (§4.4), not an error.
    fn table_exists(&self, table: &str) -> bool;

    /// Every table this store currently holds, for scans that must search
    /// across tables (multi-table mode has no index from id to table).
    fn all_tables(&self) -> Vec<String>;

    async fn drop_table(&self, table: &str) -> Result<(), PersistenceError>;
}

/// In-memory reference backend, one `HashMap` per table. Used by the demo
/// binary and by tests; a durable deployment would swap in a SQL-backed
/// `TableStore` behind the same trait.
#[derive(Default)]
pub struct MemoryTableStore<P> {
    tables: Mutex<HashMap<String, HashMap<MachineId, StoredRow<P>>>>,
}

impl<P> MemoryTableStore<P> {
    pub fn new() -> Self {
        Self { tables: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl<P: PersistentContext> TableStore<P> for MemoryTableStore<P> {
    async fn ensure_table(&self, table: &str) -> Result<(), PersistenceError> {
        self.tables.lock().entry(table.to_string()).or_default();
        Ok(())
    }

    async fn insert(&self, table: &str, row: StoredRow<P>) -> Result<(), PersistenceError> {
        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();
        rows.insert(row.entity.id().clone(), row);
        Ok(())
    }

    async fn update(&self, table: &str, row: StoredRow<P>) -> Result<(), PersistenceError> {
        let mut tables = self.tables.lock();
        let rows = tables.get_mut(table).ok_or(PersistenceError::NoCoveringTable)?;
        let id = row.entity.id().clone();
        if !rows.contains_key(&id) {
            return Err(PersistenceError::NotFound { id: id.into_string() });
        }
        rows.insert(id, row);
        Ok(())
    }

    async fn find(&self, table: &str, id: &MachineId) -> Result<Option<StoredRow<P>>, PersistenceError> {
        let tables = self.tables.lock();
        Ok(tables.get(table).and_then(|rows| rows.get(id)).cloned())
    }

    async fn delete(&self, table: &str, id: &MachineId) -> Result<Option<StoredRow<P>>, PersistenceError> {
        let mut tables = self.tables.lock();
        Ok(tables.get_mut(table).and_then(|rows| rows.remove(id)))
    }

    async fn scan_date_range(
        &self,
        table: &str,
        since_ms: u64,
        until_ms: u64,
    ) -> Result<Vec<StoredRow<P>>, PersistenceError> {
        let tables = self.tables.lock();
        let Some(rows) = tables.get(table) else { return Ok(Vec::new()) };
        Ok(rows
            .values()
            .filter(|row| row.created_at_ms >= since_ms && row.created_at_ms <= until_ms)
            .cloned()
            .collect())
    }

    fn table_exists(&self, table: &str) -> bool {
        self.tables.lock().contains_key(table)
    }

    fn all_tables(&self) -> Vec<String> {
        self.tables.lock().keys().cloned().collect()
    }

    async fn drop_table(&self, table: &str) -> Result<(), PersistenceError> {
        self.tables.lock().remove(table);
        Ok(())
    }
}

#[cfg(test)]
#[path = "table_store_tests.rs"]
mod tests;
