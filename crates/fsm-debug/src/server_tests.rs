use super::*;
use crate::protocol::{InboundCommand, InboundQuery, MachineSummary, OutboundFrame};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

#[derive(Default)]
struct FixtureHandler {
    commands: Mutex<Vec<InboundCommand>>,
}

#[async_trait::async_trait]
impl QueryHandler for FixtureHandler {
    async fn handle_query(&self, query: InboundQuery) -> OutboundFrame {
        match query {
            InboundQuery::GetMachines => OutboundFrame::MachinesList {
                machines: vec![MachineSummary { id: "call-1".into(), machine_type: "call".into() }],
            },
            other => panic!("unexpected query: {other:?}"),
        }
    }

    async fn handle_command(&self, command: InboundCommand) {
        self.commands.lock().push(command);
    }
}

async fn spawn_server() -> (std::net::SocketAddr, DebugBroadcaster, Arc<FixtureHandler>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
    let addr = listener.local_addr().expect("local addr");
    let broadcaster = DebugBroadcaster::default();
    let handler = Arc::new(FixtureHandler::default());
    tokio::spawn(serve(listener, broadcaster.clone(), Arc::clone(&handler)));
    (addr, broadcaster, handler)
}

#[tokio::test]
async fn a_published_frame_is_forwarded_to_a_connected_client() {
    let (addr, broadcaster, _handler) = spawn_server().await;
    let (mut ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}")).await.expect("connect");

    // give the server task a chance to subscribe before we publish.
    tokio::time::sleep(Duration::from_millis(20)).await;
    broadcaster.publish(OutboundFrame::MachineRegistered { machine_id: "call-1".into(), machine_type: Some("call".into()) });

    let received = tokio::time::timeout(Duration::from_secs(1), ws.next())
        .await
        .expect("timed out waiting for broadcast frame")
        .expect("stream ended")
        .expect("websocket error");
    let Message::Text(text) = received else { panic!("expected a text frame") };
    let frame: OutboundFrame = serde_json::from_str(&text).expect("valid json");
    assert_eq!(frame, OutboundFrame::MachineRegistered { machine_id: "call-1".into(), machine_type: Some("call".into()) });
}

#[tokio::test]
async fn a_query_frame_gets_a_direct_reply() {
    let (addr, _broadcaster, _handler) = spawn_server().await;
    let (mut ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}")).await.expect("connect");

    let query = json!({ "action": "GET_MACHINES" }).to_string();
    ws.send(Message::text(query)).await.expect("send query");

    let received = tokio::time::timeout(Duration::from_secs(1), ws.next())
        .await
        .expect("timed out waiting for reply")
        .expect("stream ended")
        .expect("websocket error");
    let Message::Text(text) = received else { panic!("expected a text frame") };
    let frame: OutboundFrame = serde_json::from_str(&text).expect("valid json");
    match frame {
        OutboundFrame::MachinesList { machines } => assert_eq!(machines.len(), 1),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn a_command_frame_is_dispatched_to_the_handler_with_no_direct_reply() {
    let (addr, _broadcaster, handler) = spawn_server().await;
    let (mut ws, _response) = tokio_tungstenite::connect_async(format!("ws://{addr}")).await.expect("connect");

    let command = json!({
        "type": "EVENT",
        "machineId": "call-1",
        "eventType": "HANGUP",
        "payload": {},
    })
    .to_string();
    ws.send(Message::text(command)).await.expect("send command");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(handler.commands.lock().len(), 1);
}
