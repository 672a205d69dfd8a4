// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! What `dispatch()` decided, independent of the history records it produced.

use std::time::Duration;

/// Why an event was ignored (§4.2 steps 1–2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The machine was already in a final state.
    FinalState,
    /// The current state has no mapping for the event's type.
    NoTransition,
}

/// The result of running the dispatch algorithm for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Transitioned { from: String, to: String },
    StayedPut { state: String },
    Ignored { state: String, reason: IgnoredReason },
    /// A transition landed on a final state; the machine is now complete
    /// and the registry should archive it.
    Completed { from: String, final_state: String },
}

/// What the caller should do with the machine's timeout registration as a
/// result of this dispatch (§4.2 step 4a/4g, §5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerDirective {
    /// No change to the armed timer.
    None,
    /// Cancel any pending timer for this machine; no replacement armed.
    Cancel,
    /// Cancel any pending timer, then arm a new one. `armed_for_state` is
    /// the state the machine was in when the timer was armed — compared
    /// against `currentState` when the timer fires, so a stale callback
    /// from a state the machine has already left is filtered (§5).
    /// `target_state` is where the synthesised `TIMEOUT` event transitions
    /// to once that check passes.
    Arm { delay: Duration, armed_for_state: String, target_state: String },
}
