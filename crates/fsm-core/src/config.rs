// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Centralized environment-variable configuration, mirroring the shape of
//! a daemon's env module: one function per knob, each with a sane default
//! so the runtime works out of the box in tests and demos.

use std::time::Duration;

/// How long the archival path retries a failed move before invoking the
/// critical-failure callback (§4.6).
pub fn archival_max_retries() -> u32 {
    env_parsed("FSM_ARCHIVAL_MAX_RETRIES").unwrap_or(5)
}

/// Base delay for archival retry backoff; doubled on each attempt.
pub fn archival_retry_base_delay() -> Duration {
    env_parsed("FSM_ARCHIVAL_RETRY_BASE_MS").map(Duration::from_millis).unwrap_or(Duration::from_millis(200))
}

/// Capacity of each machine's mailbox channel.
pub fn mailbox_capacity() -> usize {
    env_parsed("FSM_MAILBOX_CAPACITY").unwrap_or(256)
}

/// Capacity of each machine's history queue.
pub fn history_queue_capacity() -> usize {
    env_parsed("FSM_HISTORY_QUEUE_CAPACITY").unwrap_or(1024)
}

/// How long `HistoryTracker::close` waits for the queue to drain before
/// shutting down its worker anyway (§4.5).
pub fn history_drain_timeout() -> Duration {
    env_parsed("FSM_HISTORY_DRAIN_TIMEOUT_MS").map(Duration::from_millis).unwrap_or(Duration::from_secs(2))
}

/// How long `TimeoutManager::shutdown` waits for in-flight callbacks.
pub fn timeout_shutdown_grace() -> Duration {
    env_parsed("FSM_TIMEOUT_SHUTDOWN_GRACE_MS").map(Duration::from_millis).unwrap_or(Duration::from_secs(2))
}

/// Retention window for the history database's scheduled pruner.
pub fn retention_days() -> u32 {
    env_parsed("FSM_RETENTION_DAYS").unwrap_or(90)
}

/// Bind address for the debug WebSocket channel.
pub fn debug_bind_addr() -> String {
    std::env::var("FSM_DEBUG_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:7878".to_string())
}

/// Per-subscriber buffer depth on the debug channel broadcast; the oldest
/// frame is dropped when a slow subscriber falls behind (§5).
pub fn debug_broadcast_capacity() -> usize {
    env_parsed("FSM_DEBUG_BROADCAST_CAPACITY").unwrap_or(128)
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
