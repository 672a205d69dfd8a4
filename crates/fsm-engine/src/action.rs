// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Action function signatures (§4.2).
//!
//! Actions are synchronous from the engine's perspective (§5): a
//! long-running action blocks only the mailbox of the machine it belongs
//! to, never the registry or any other machine.

use fsm_core::{ActionError, PersistentContext, VolatileContext};

/// An entry or exit action: runs with mutable access to both contexts,
/// no event in scope.
pub type EntryExitAction<P, V> = Box<dyn Fn(&mut P, &mut V) -> Result<(), ActionError> + Send + Sync>;

/// A stay handler: runs with mutable access to both contexts and the
/// triggering event, does not change state (§4.2 step 3).
pub type StayHandler<P, V, E> =
    Box<dyn Fn(&mut P, &mut V, &E) -> Result<(), ActionError> + Send + Sync>;

pub(crate) fn run_entry_exit<P, V>(
    action: &Option<EntryExitAction<P, V>>,
    persistent: &mut P,
    volatile: &mut V,
) -> Option<Result<(), ActionError>>
where
    P: PersistentContext,
    V: VolatileContext<P>,
{
    action.as_ref().map(|f| f(persistent, volatile))
}
