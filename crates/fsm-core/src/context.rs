// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Persistent and volatile context contracts (§3).

use crate::id::MachineId;
use serde::Serialize;

/// The durable projection of a machine's state.
///
/// Invariants enforced by the engine, not by implementors:
/// - `complete()` ⇔ `current_state()` is a declared final state.
/// - `last_state_change_ms()` is monotonically non-decreasing per machine.
/// - `current_state()` is always a declared state of the machine's definition.
pub trait PersistentContext: Clone + Send + Sync + Serialize + 'static {
    fn id(&self) -> &MachineId;
    fn current_state(&self) -> &str;
    fn set_current_state(&mut self, state: &str);
    fn last_state_change_ms(&self) -> u64;
    fn set_last_state_change_ms(&mut self, ms: u64);
    fn complete(&self) -> bool;
    fn set_complete(&mut self, complete: bool);

    /// Deep copy for history snapshots, so a before/after pair never
    /// aliases the live instance (§9 "Deep context copies"). The default
    /// impl uses `Clone`, which is sufficient as long as the context holds
    /// no shared interior-mutable state — implementors with such fields
    /// (e.g. `Arc<Mutex<_>>` caches) must override this.
    fn deep_copy(&self) -> Self {
        self.clone()
    }
}

/// Non-durable, per-machine runtime state.
///
/// Reconstructed from the persistent context via [`VolatileContext::rehydrate`]
/// whenever a machine is activated — never loaded from storage, since it
/// holds things like session handles that cannot survive a process
/// restart. Implementations must tolerate the persistent context having
/// changed state while the machine was evicted (§3).
pub trait VolatileContext<P: PersistentContext>: Send + Sync + 'static {
    /// Build volatile state from scratch given the (possibly stale, now
    /// freshly-loaded) persistent context.
    fn rehydrate(persistent: &P) -> Self;

    /// Deep copy for history snapshots (§3, §9). Default is a no-op
    /// producer of a fresh `rehydrate`-equivalent snapshot — override when
    /// volatile fields carry data worth observing in history.
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
