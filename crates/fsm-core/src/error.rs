// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Error kinds shared across the runtime, one per §7 of the specification.

use crate::id::MachineId;
use thiserror::Error;

/// Raised at machine-definition build time; fatal to construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("initial state {0:?} is not a declared state")]
    UndeclaredInitialState(String),

    #[error("transition from {from:?} names undeclared target state {target:?}")]
    UndeclaredTargetState { from: String, target: String },

    #[error("state {0:?} is declared twice")]
    DuplicateState(String),

    #[error("state {0:?} has a timeout declared twice")]
    DuplicateTimeout(String),

    #[error("in state {state:?}, event {event:?} is bound as both a stay handler and a transition")]
    StayAndTransitionConflict { state: String, event: String },
}

/// Raised when a user-supplied entry/exit/stay action fails.
///
/// The engine does not roll back any already-committed state write when
/// this occurs (§4.2): persistence commits before actions run, so side
/// effects in actions must themselves be idempotent.
#[derive(Debug, Error, Clone)]
#[error("{kind}: {message}")]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
}

impl ActionError {
    pub fn new(kind: ActionErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionErrorKind {
    Entry,
    Exit,
    Stay,
}

impl std::fmt::Display for ActionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ActionErrorKind::Entry => "ERROR_ENTRY",
            ActionErrorKind::Exit => "ERROR_EXIT",
            ActionErrorKind::Stay => "ERROR_STAY",
        })
    }
}

/// Errors from the persistence adapter.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("row {id} not found")]
    NotFound { id: String },

    #[error("no partition/table covers the requested date range")]
    NoCoveringTable,

    #[error("backend I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors surfaced by the registry's routing path.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("machine {0} is unknown and could not be rehydrated")]
    UnknownMachine(MachineId),

    #[error("machine {0} has already reached a final state")]
    AlreadyComplete(MachineId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("registry is shutting down and no longer accepts new work")]
    ShuttingDown,
}

/// Errors from the debug channel's wire protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON frame: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unknown action {0:?}")]
    UnknownAction(String),
}
