// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Immutable machine definitions: the transition table produced by the
//! builder (§4.2). A [`MachineDefinition`] carries no state leaking
//! between independently built instances (§9) — rebuilding always yields
//! an independent, owned table.

use crate::action::{EntryExitAction, StayHandler};
use std::collections::HashMap;
use std::time::Duration;

/// What happens when an event is mapped in a state (§3).
pub enum Transition<P, V, E> {
    /// Exit the current state, enter `target`.
    To(String),
    /// Run `handler`, stay in the current state.
    Stay(StayHandler<P, V, E>),
}

impl<P, V, E> Transition<P, V, E> {
    pub fn target_state(&self) -> Option<&str> {
        match self {
            Transition::To(target) => Some(target),
            Transition::Stay(_) => None,
        }
    }
}

/// A single declared state: its actions, outbound transitions, optional
/// timeout, and flags (§3, §4.2).
pub struct StateDef<P, V, E> {
    pub name: String,
    pub on_entry: Option<EntryExitAction<P, V>>,
    pub on_exit: Option<EntryExitAction<P, V>>,
    pub transitions: HashMap<String, Transition<P, V, E>>,
    pub timeout: Option<(Duration, String)>,
    pub offline: bool,
    pub final_state: bool,
    /// Event types bound as both a stay handler and a transition target
    /// by the builder, reported as `ConfigError::StayAndTransitionConflict`
    /// at `build()` time.
    pub(crate) conflicting_events: Vec<String>,
}

impl<P, V, E> StateDef<P, V, E> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_entry: None,
            on_exit: None,
            transitions: HashMap::new(),
            timeout: None,
            offline: false,
            final_state: false,
            conflicting_events: Vec::new(),
        }
    }
}

/// The full, immutable definition of a machine: every declared state and
/// the id of the state a fresh instance starts in.
pub struct MachineDefinition<P, V, E> {
    pub(crate) states: HashMap<String, StateDef<P, V, E>>,
    pub(crate) initial_state: String,
}

impl<P, V, E> MachineDefinition<P, V, E> {
    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn state(&self, name: &str) -> Option<&StateDef<P, V, E>> {
        self.states.get(name)
    }

    pub fn is_final_state(&self, name: &str) -> bool {
        self.states.get(name).map(|s| s.final_state).unwrap_or(false)
    }

    pub fn is_offline_state(&self, name: &str) -> bool {
        self.states.get(name).map(|s| s.offline).unwrap_or(false)
    }

    pub fn final_states(&self) -> impl Iterator<Item = &str> {
        self.states.values().filter(|s| s.final_state).map(|s| s.name.as_str())
    }
}
