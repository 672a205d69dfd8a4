// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Stable identifiers used across the runtime.

use uuid::Uuid;

crate::define_id! {
    /// Stable identifier for a machine instance. Caller-supplied (e.g. a
    /// call id, an order number) — never generated by the runtime.
    pub struct MachineId;
}

crate::define_id! {
    /// Opaque token assigned on every activation (start or rehydrate) of a
    /// machine, used to disambiguate lifetimes in history records.
    pub struct RunId;
}

impl RunId {
    /// Generate a fresh, globally unique run id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
