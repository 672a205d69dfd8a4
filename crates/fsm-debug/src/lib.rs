// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Wire contract, broadcast fan-out, and WebSocket transport for the
//! live debug channel (§6). Any process embedding this crate owns the
//! live machines; it implements [`QueryHandler`] once and hands a bound
//! `TcpListener` plus a [`DebugBroadcaster`] to [`server::serve`].

mod broadcast;
mod handler;
mod protocol;
mod server;

pub use broadcast::DebugBroadcaster;
pub use handler::QueryHandler;
pub use protocol::{EntryActionStatus, InboundCommand, InboundFrame, InboundQuery, MachineSummary, OutboundFrame};
pub use server::serve;
