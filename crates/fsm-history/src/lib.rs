// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fsm-history: the append-only per-machine history log (§4.5) — a
//! single background writer, base64-encoded JSON snapshots, and grouping
//! into `StateInstance` runs for inspection.

pub mod codec;
pub mod grouping;
pub mod record_store;
pub mod tracker;

pub use grouping::read_grouped;
pub use record_store::{table_name_for, HistoryStore, MemoryHistoryStore};
pub use tracker::HistoryTracker;
