// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The stored-row envelope (§6 active/history schema).

use serde::{Deserialize, Serialize};

/// A persisted entity plus the row metadata the storage layer owns but
/// [`fsm_core::PersistentContext`] does not model: the row's creation
/// time, used to pick which partition/table an entity lives in and to
/// answer date-range queries. `last_state_change_ms` on the entity itself
/// tracks the most recent transition, which is a different timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRow<P> {
    pub entity: P,
    pub created_at_ms: u64,
}

impl<P> StoredRow<P> {
    pub fn new(entity: P, created_at_ms: u64) -> Self {
        Self { entity, created_at_ms }
    }
}
