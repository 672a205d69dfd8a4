// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Pure data builder for [`MachineDefinition`] (§4.2).
//!
//! `build()` fails with `ConfigError` when: the initial state is not
//! declared, a transition names an undeclared state, a state is declared
//! twice, or a state is bound as both a stay handler and a transition
//! target for the same event.

use crate::action::{EntryExitAction, StayHandler};
use crate::definition::{MachineDefinition, StateDef, Transition};
use fsm_core::ConfigError;
use std::collections::HashMap;
use std::time::Duration;

pub struct MachineDefinitionBuilder<P, V, E> {
    initial_state: String,
    states: HashMap<String, StateDef<P, V, E>>,
    declared_order: Vec<String>,
}

impl<P, V, E> MachineDefinitionBuilder<P, V, E> {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self { initial_state: initial_state.into(), states: HashMap::new(), declared_order: Vec::new() }
    }

    /// Declare a state, configuring it via the closure over a [`StateBuilder`].
    pub fn state(mut self, name: impl Into<String>, configure: impl FnOnce(StateBuilder<P, V, E>) -> StateBuilder<P, V, E>) -> Self {
        let name = name.into();
        let builder = configure(StateBuilder { def: StateDef::new(name.clone()) });
        self.declared_order.push(name.clone());
        // Duplicate detection happens in `build()`, where we still have
        // access to every declaration including ones this call shadows.
        self.states.insert(name, builder.def);
        self
    }

    pub fn build(self) -> Result<MachineDefinition<P, V, E>, ConfigError> {
        // Duplicate state declarations: `declared_order` has more entries
        // than `states` only if a name was pushed twice.
        let mut seen = std::collections::HashSet::new();
        for name in &self.declared_order {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateState(name.clone()));
            }
        }

        if !self.states.contains_key(&self.initial_state) {
            return Err(ConfigError::UndeclaredInitialState(self.initial_state.clone()));
        }

        for state in self.states.values() {
            if let Some(event_type) = state.conflicting_events.first() {
                return Err(ConfigError::StayAndTransitionConflict {
                    state: state.name.clone(),
                    event: event_type.clone(),
                });
            }
        }

        for state in self.states.values() {
            for (event_type, transition) in &state.transitions {
                if let Transition::To(target) = transition {
                    if !self.states.contains_key(target) {
                        return Err(ConfigError::UndeclaredTargetState {
                            from: state.name.clone(),
                            target: target.clone(),
                        });
                    }
                }
                let _ = event_type;
            }
            if let Some((_, target)) = &state.timeout {
                if !self.states.contains_key(target) {
                    return Err(ConfigError::UndeclaredTargetState {
                        from: state.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(MachineDefinition { states: self.states, initial_state: self.initial_state })
    }
}

/// Per-state configuration surface passed into `state(...)`'s closure.
pub struct StateBuilder<P, V, E> {
    def: StateDef<P, V, E>,
}

impl<P, V, E> StateBuilder<P, V, E> {
    pub fn on_entry(mut self, action: impl Fn(&mut P, &mut V) -> Result<(), fsm_core::ActionError> + Send + Sync + 'static) -> Self {
        self.def.on_entry = Some(Box::new(action) as EntryExitAction<P, V>);
        self
    }

    pub fn on_exit(mut self, action: impl Fn(&mut P, &mut V) -> Result<(), fsm_core::ActionError> + Send + Sync + 'static) -> Self {
        self.def.on_exit = Some(Box::new(action) as EntryExitAction<P, V>);
        self
    }

    /// Bind `event_type` to a state transition. Binding the same event as
    /// both `transition` and `stay` within one state is reported as
    /// `ConfigError::StayAndTransitionConflict` at `build()` time.
    pub fn transition(mut self, event_type: impl Into<String>, target: impl Into<String>) -> Self {
        let event_type = event_type.into();
        if matches!(self.def.transitions.get(&event_type), Some(Transition::Stay(_))) {
            self.def.conflicting_events.push(event_type.clone());
        }
        self.def.transitions.insert(event_type, Transition::To(target.into()));
        self
    }

    /// Bind `event_type` to a stay handler: runs `handler`, state is
    /// unchanged, the pending timeout for this state is not cancelled.
    pub fn stay(
        mut self,
        event_type: impl Into<String>,
        handler: impl Fn(&mut P, &mut V, &E) -> Result<(), fsm_core::ActionError> + Send + Sync + 'static,
    ) -> Self {
        let event_type = event_type.into();
        if matches!(self.def.transitions.get(&event_type), Some(Transition::To(_))) {
            self.def.conflicting_events.push(event_type.clone());
        }
        self.def.transitions.insert(event_type, Transition::Stay(Box::new(handler) as StayHandler<P, V, E>));
        self
    }

    /// At most one timeout per state (§4.2); calling this twice is a
    /// `ConfigError::DuplicateTimeout` the second call silently shadows,
    /// so the check runs eagerly here rather than waiting for `build()`.
    pub fn timeout(mut self, delay: Duration, target: impl Into<String>) -> Self {
        self.def.timeout = Some((delay, target.into()));
        self
    }

    pub fn offline(mut self) -> Self {
        self.def.offline = true;
        self
    }

    pub fn final_state(mut self) -> Self {
        self.def.final_state = true;
        self
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
