use super::*;
use crate::protocol::MachineSummary;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

#[derive(Default)]
struct RecordingHandler {
    commands: Mutex<Vec<InboundCommand>>,
}

#[async_trait]
impl QueryHandler for RecordingHandler {
    async fn handle_query(&self, query: InboundQuery) -> OutboundFrame {
        match query {
            InboundQuery::GetMachines => OutboundFrame::MachinesList {
                machines: vec![MachineSummary { id: "call-1".into(), machine_type: "call".into() }],
            },
            other => panic!("unexpected query in test: {other:?}"),
        }
    }

    async fn handle_command(&self, command: InboundCommand) {
        self.commands.lock().push(command);
    }
}

#[tokio::test]
async fn handle_query_dispatches_to_the_matching_branch() {
    let handler = RecordingHandler::default();
    let reply = handler.handle_query(InboundQuery::GetMachines).await;
    match reply {
        OutboundFrame::MachinesList { machines } => assert_eq!(machines.len(), 1),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn handle_command_is_recorded_and_produces_no_reply() {
    let handler = Arc::new(RecordingHandler::default());
    handler
        .handle_command(InboundCommand::Event {
            machine_id: "call-1".into(),
            event_type: "HANGUP".into(),
            payload: json!({}),
        })
        .await;
    assert_eq!(handler.commands.lock().len(), 1);
}
