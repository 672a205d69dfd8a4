// SPDX-License-Identifier: MIT
// Copyright (c) 2026 FSM Runtime Contributors

//! The WebSocket accept loop for the debug channel (§6). Mirrors the
//! teacher's own WebSocket usage in
//! `crates/daemon/src/adapters/agent/docker/ws.rs`, which drives
//! `tokio_tungstenite::client_async` to connect *out* to a container;
//! here we drive the same crate's `accept_async` to accept connections
//! *in*, splitting the stream the same way (`.split()` into a sink half
//! forwarding broadcast frames and a stream half reading inbound frames).

use crate::broadcast::DebugBroadcaster;
use crate::handler::QueryHandler;
use crate::protocol::InboundFrame;
use futures_util::{SinkExt, StreamExt};
use std::io;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;

/// Accept connections on `listener` forever, spawning one task per
/// connection. Returns only on a listener-level I/O error.
pub async fn serve<H: QueryHandler>(listener: TcpListener, broadcaster: DebugBroadcaster, handler: Arc<H>) -> io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let broadcaster = broadcaster.clone();
        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            if let Err(error) = handle_connection(stream, broadcaster, handler).await {
                tracing::warn!(%peer, %error, "debug channel connection ended");
            }
        });
    }
}

async fn handle_connection<H: QueryHandler>(
    stream: TcpStream,
    broadcaster: DebugBroadcaster,
    handler: Arc<H>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut write, mut read) = ws.split();
    let mut updates = broadcaster.subscribe();

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(frame) => {
                        let text = serde_json::to_string(&frame).unwrap_or_default();
                        if write.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "debug channel subscriber lagged, frames dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<InboundFrame>(&text) {
                            Ok(InboundFrame::Query(query)) => {
                                let reply = handler.handle_query(query).await;
                                let text = serde_json::to_string(&reply).unwrap_or_default();
                                if write.send(Message::text(text)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(InboundFrame::Command(command)) => {
                                handler.handle_command(command).await;
                            }
                            Err(error) => {
                                tracing::warn!(%error, "debug channel: malformed inbound frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::warn!(%error, "debug channel read error");
                        break;
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
