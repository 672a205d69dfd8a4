// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The seam between the transport in `server.rs` and whatever owns the
//! live machines. `fsm-debug` stays generic-free by routing every query
//! and command through this trait instead of depending on
//! `fsm-registry`'s generic `Registry<P,V,E,A,AR,C>` directly — the
//! binary that knows the concrete types (`fsm-demo`) implements it once.

use crate::protocol::{InboundCommand, InboundQuery, OutboundFrame};
use async_trait::async_trait;

#[async_trait]
pub trait QueryHandler: Send + Sync + 'static {
    /// Answer a read-only query frame directly.
    async fn handle_query(&self, query: InboundQuery) -> OutboundFrame;

    /// Apply a command frame (`EVENT`/`EVENT_TO_ARBITRARY`). Any resulting
    /// `STATE_CHANGE` broadcast is expected to go out through the same
    /// `DebugBroadcaster` the handler was constructed with, not as a
    /// direct reply — the spec models these as fire-and-forget.
    async fn handle_command(&self, command: InboundCommand);
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
