// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Event model: a tagged value with a stable string type and an opaque
//! payload (§3, §4.1). The runtime is generic over concrete domain event
//! types; callers implement [`MachineEvent`] and optionally register a
//! variant → tag mapping through [`EventTypeRegistry`] at startup.
//!
//! This replaces the class-hierarchy-plus-reflection event model a
//! straight port would carry over: dispatch here is tag equality against
//! an explicit registry, never type introspection (§9).

use std::collections::HashMap;

/// The synthesised event type used for timer arrivals (§4.2).
pub const TIMEOUT_EVENT_TYPE: &str = "TIMEOUT";

/// A domain event dispatched to a machine.
///
/// `event_type` returns the registered tag for this event's variant, or a
/// deterministic fallback (the value returned by [`MachineEvent::fallback_type`])
/// when no registry is consulted. Implementors are expected to be cheap to
/// clone — events are immutable once emitted and are snapshotted into
/// history records.
pub trait MachineEvent: Clone + Send + Sync + 'static {
    /// A stable discriminant used to key the [`EventTypeRegistry`]. Two
    /// events that should dispatch identically must return equal
    /// discriminants.
    fn discriminant(&self) -> &'static str;

    /// Deterministic fallback tag, used when the discriminant has no entry
    /// in the registry (§4.1: "unknown events are legal").
    fn fallback_type(&self) -> String {
        self.discriminant().to_string()
    }

    /// The event's payload, serialized for history snapshots (§3).
    fn payload_json(&self) -> serde_json::Value;
}

/// Maps an event's discriminant to the stable string tag used for
/// transition-table lookups and history records.
///
/// Populated by callers via [`EventTypeRegistry::register`] at startup; the
/// registry is just a lookup table, never consulted for routing semantics
/// beyond name resolution.
#[derive(Debug, Default, Clone)]
pub struct EventTypeRegistry {
    tags: HashMap<&'static str, String>,
}

impl EventTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the string tag for an event discriminant.
    pub fn register(&mut self, discriminant: &'static str, tag: impl Into<String>) -> &mut Self {
        self.tags.insert(discriminant, tag.into());
        self
    }

    /// Resolve an event's type tag: the registered mapping, or the event's
    /// own deterministic fallback if none was registered.
    pub fn event_type<E: MachineEvent>(&self, event: &E) -> String {
        self.tags.get(event.discriminant()).cloned().unwrap_or_else(|| event.fallback_type())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
