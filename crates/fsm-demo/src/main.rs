// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! Reference binary wiring the FSM runtime's crates around the toy call
//! machine (§8 scenario 1), with the debug WebSocket channel (§4.7)
//! listening alongside it.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod call;
mod handler;

use call::{call_definition, CallContext};
use clap::Parser;
use fsm_core::{EventTypeRegistry, SystemClock};
use fsm_debug::DebugBroadcaster;
use fsm_history::{HistoryTracker, MemoryHistoryStore};
use fsm_registry::{ArchivePolicy, Archiver};
use fsm_storage::{MemoryTableStore, PartitionStrategy, RotatingPersistenceAdapter};
use handler::DemoHandler;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fsm-demo", about = "Reference FSM runtime binary")]
struct Cli {
    /// Bind address for the debug WebSocket channel.
    #[arg(long, default_value_t = fsm_core::config::debug_bind_addr())]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    let active = Arc::new(RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("active")));
    let history_store = Arc::new(MemoryHistoryStore::new());
    let (history, _history_worker) = HistoryTracker::spawn(Arc::clone(&history_store));
    let completed = Arc::new(RotatingPersistenceAdapter::new(MemoryTableStore::new(), PartitionStrategy::partitioned("completed")));

    let archiver = Archiver::new(
        completed,
        ArchivePolicy { max_attempts: fsm_core::config::archival_max_retries(), initial_backoff: fsm_core::config::archival_retry_base_delay() },
        Arc::new(|id: &fsm_core::MachineId, error: &fsm_core::PersistenceError| {
            tracing::error!(%id, %error, "archival permanently failed, machine left in the active store");
        }),
    );

    let registry = fsm_registry::Registry::new(
        call_definition()?,
        Arc::new(EventTypeRegistry::new()),
        Arc::clone(&active),
        history,
        archiver,
        SystemClock,
    );

    let recovered = registry.startup_scan(u64::MAX).await?;
    if recovered > 0 {
        info!(recovered, "archived machines left complete from a prior run");
    }

    registry.register(CallContext::new("demo-call-1")).await?;
    info!("registered demo-call-1 in ADMISSION");

    let broadcaster = DebugBroadcaster::new(fsm_core::config::debug_broadcast_capacity());
    let demo_handler = Arc::new(DemoHandler::new(registry, active, history_store, broadcaster.clone()));

    let listener = TcpListener::bind(cli.bind.as_str()).await?;
    info!(bind = %cli.bind, "debug channel listening");
    let serve_handle = tokio::spawn(fsm_debug::serve(listener, broadcaster, demo_handler));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
        result = serve_handle => {
            match result {
                Ok(Err(error)) => tracing::error!(%error, "debug channel accept loop failed"),
                Err(error) => tracing::error!(%error, "debug channel task panicked"),
                Ok(Ok(())) => {}
            }
        }
    }

    Ok(())
}
