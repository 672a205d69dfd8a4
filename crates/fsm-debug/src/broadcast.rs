// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Fan-out for outbound debug frames (§5: "the debug channel is a
//! broadcast fan-out; subscribers are independent and one slow
//! subscriber must not block the engine"). `tokio::sync::broadcast`
//! gives exactly this: a lagging subscriber misses messages instead of
//! backing up the sender, so `publish` from the registry's mailbox tasks
//! never blocks on a slow browser tab.

use crate::protocol::OutboundFrame;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct DebugBroadcaster {
    tx: broadcast::Sender<OutboundFrame>,
}

impl DebugBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutboundFrame> {
        self.tx.subscribe()
    }

    /// Publish a frame to every current subscriber. A send error here
    /// only means there are no subscribers at all, which is routine (no
    /// debug client connected) and not worth logging as a failure.
    pub fn publish(&self, frame: OutboundFrame) {
        let _ = self.tx.send(frame);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for DebugBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "broadcast_tests.rs"]
mod tests;
