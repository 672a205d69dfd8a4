// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The reference call-routing machine (§8 scenario 1): `ADMISSION ->
//! RINGING -> CONNECTED -> HUNGUP`, a stay handler that counts ring
//! progress notifications, and a 30s ring timeout that hangs the call up.

use fsm_core::{ActionError, ConfigError, MachineEvent, MachineId, PersistentContext, VolatileContext};
use fsm_engine::{MachineDefinition, MachineDefinitionBuilder};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CallContext {
    pub id: MachineId,
    pub state: String,
    pub last_change_ms: u64,
    pub complete: bool,
    pub ring_count: u32,
}

impl CallContext {
    pub fn new(id: impl Into<MachineId>) -> Self {
        Self { id: id.into(), state: String::new(), last_change_ms: 0, complete: false, ring_count: 0 }
    }
}

impl PersistentContext for CallContext {
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

/// Nothing durable to reconstruct for this toy machine; present so the
/// registry's `V: VolatileContext<P>` generic parameter has a real type
/// to exercise rather than `()`.
pub struct CallVolatile;

impl VolatileContext<CallContext> for CallVolatile {
    fn rehydrate(_persistent: &CallContext) -> Self {
        CallVolatile
    }
}

#[derive(Debug, Clone)]
pub enum CallEvent {
    IncomingCall,
    Answer,
    Hangup,
    SessionProgress,
    Reject,
}

impl CallEvent {
    pub const INCOMING_CALL: &'static str = "INCOMING_CALL";
    pub const ANSWER: &'static str = "ANSWER";
    pub const HANGUP: &'static str = "HANGUP";
    pub const SESSION_PROGRESS: &'static str = "SESSION_PROGRESS";
    pub const REJECT: &'static str = "REJECT";

    /// Map a wire event type (from `EVENT`/`EVENT_TO_ARBITRARY` debug
    /// commands) onto a concrete event, or `None` for anything this
    /// machine doesn't know the name of.
    pub fn from_wire(event_type: &str) -> Option<Self> {
        match event_type {
            Self::INCOMING_CALL => Some(Self::IncomingCall),
            Self::ANSWER => Some(Self::Answer),
            Self::HANGUP => Some(Self::Hangup),
            Self::SESSION_PROGRESS => Some(Self::SessionProgress),
            Self::REJECT => Some(Self::Reject),
            _ => None,
        }
    }
}

impl MachineEvent for CallEvent {
    fn discriminant(&self) -> &'static str {
        match self {
            Self::IncomingCall => Self::INCOMING_CALL,
            Self::Answer => Self::ANSWER,
            Self::Hangup => Self::HANGUP,
            Self::SessionProgress => Self::SESSION_PROGRESS,
            Self::Reject => Self::REJECT,
        }
    }

    fn payload_json(&self) -> Value {
        Value::Null
    }
}

pub fn call_definition() -> Result<Arc<MachineDefinition<CallContext, CallVolatile, CallEvent>>, ConfigError> {
    let definition = MachineDefinitionBuilder::new("ADMISSION")
        .state("ADMISSION", |s| s.transition(CallEvent::INCOMING_CALL, "RINGING"))
        .state("RINGING", |s| {
            s.transition(CallEvent::ANSWER, "CONNECTED")
                .stay(CallEvent::SESSION_PROGRESS, |persistent: &mut CallContext, _volatile, _event| {
                    persistent.ring_count += 1;
                    Ok::<(), ActionError>(())
                })
                .timeout(Duration::from_secs(30), "HUNGUP")
        })
        .state("CONNECTED", |s| s.transition(CallEvent::HANGUP, "HUNGUP").offline())
        .state("HUNGUP", |s| s.final_state())
        .build()?;
    Ok(Arc::new(definition))
}

#[cfg(test)]
#[path = "call_tests.rs"]
mod tests;
