// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Bookkeeping for one armed timer (§4.3).

use std::time::Duration;
use tokio::task::JoinHandle;

/// An armed timer: the task sleeping for it, the state it was armed for
/// (compared against `currentState` when the timer fires, per §5), and a
/// generation counter distinguishing it from whatever timer (if any)
/// later replaces it in the map for the same machine id.
pub(crate) struct ArmedTimer {
    pub(crate) armed_for_state: String,
    pub(crate) generation: u64,
    pub(crate) task: JoinHandle<()>,
}

impl ArmedTimer {
    pub(crate) fn abort(self) {
        self.task.abort();
    }
}

/// Point-in-time counters exposed by [`crate::TimeoutManager::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeoutStats {
    pub scheduled: u64,
    pub fired: u64,
    pub cancelled: u64,
    pub active: u64,
}

/// How long `shutdown` waits for in-flight callbacks before giving up.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
