// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The append-only backend contract for one machine's history table
//! (§4.5, §6: `history_<sanitised_id>`).

use async_trait::async_trait;
use fsm_core::{history_table_name, HistoryRecord, MachineId, PersistenceError};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Conservative identifier length a durable SQL backend can be expected to
/// accept unmangled (Postgres' own limit is 63 bytes). Ids under this
/// length keep `fsm_core::history_table_name`'s readable sanitisation;
/// longer ids fall back to a content hash so the name stays a valid,
/// unique identifier regardless of backend.
const MAX_TABLE_NAME_LEN: usize = 63;

/// The table name a machine's history is written under.
pub fn table_name_for(id: &MachineId) -> String {
    let sanitised = history_table_name(id);
    if sanitised.len() <= MAX_TABLE_NAME_LEN {
        return sanitised;
    }
    let digest = Sha256::digest(id.as_str().as_bytes());
    format!("history_{:x}", digest)[..MAX_TABLE_NAME_LEN].to_string()
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn ensure_table(&self, table: &str) -> Result<(), PersistenceError>;
    async fn append(&self, table: &str, record: HistoryRecord) -> Result<(), PersistenceError>;
    async fn read_all(&self, table: &str) -> Result<Vec<HistoryRecord>, PersistenceError>;
    async fn read_since(&self, table: &str, last_id: u64) -> Result<Vec<HistoryRecord>, PersistenceError>;
}

/// In-memory reference backend: one append-only `Vec` per table, ordered
/// by insertion (which is also `HistoryRecord::id` order, since the
/// engine assigns ids monotonically per machine before handing records to
/// the tracker).
#[derive(Default)]
pub struct MemoryHistoryStore {
    tables: Mutex<HashMap<String, Vec<HistoryRecord>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self { tables: Mutex::new(HashMap::new()) }
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn ensure_table(&self, table: &str) -> Result<(), PersistenceError> {
        self.tables.lock().entry(table.to_string()).or_default();
        Ok(())
    }

    async fn append(&self, table: &str, record: HistoryRecord) -> Result<(), PersistenceError> {
        self.tables.lock().entry(table.to_string()).or_default().push(record);
        Ok(())
    }

    async fn read_all(&self, table: &str) -> Result<Vec<HistoryRecord>, PersistenceError> {
        Ok(self.tables.lock().get(table).cloned().unwrap_or_default())
    }

    async fn read_since(&self, table: &str, last_id: u64) -> Result<Vec<HistoryRecord>, PersistenceError> {
        Ok(self
            .tables
            .lock()
            .get(table)
            .map(|rows| rows.iter().filter(|r| r.id > last_id).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "record_store_tests.rs"]
mod tests;
