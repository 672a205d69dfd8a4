use super::*;

#[test]
fn get_machines_parses_as_a_query_frame() {
    let frame: InboundFrame = serde_json::from_str(r#"{"action":"GET_MACHINES"}"#).expect("parse");
    assert_eq!(frame, InboundFrame::Query(InboundQuery::GetMachines));
}

#[test]
fn get_history_since_parses_camel_case_fields() {
    let json = r#"{"action":"GET_HISTORY_SINCE","machineId":"call-1","lastId":42}"#;
    let frame: InboundFrame = serde_json::from_str(json).expect("parse");
    assert_eq!(
        frame,
        InboundFrame::Query(InboundQuery::GetHistorySince { machine_id: "call-1".to_string(), last_id: 42 })
    );
}

#[test]
fn event_frame_parses_as_a_command_frame() {
    let json = r#"{"type":"EVENT","machineId":"call-1","eventType":"ANSWER","payload":null}"#;
    let frame: InboundFrame = serde_json::from_str(json).expect("parse");
    assert_eq!(
        frame,
        InboundFrame::Command(InboundCommand::Event {
            machine_id: "call-1".to_string(),
            event_type: "ANSWER".to_string(),
            payload: serde_json::Value::Null,
        })
    );
}

#[test]
fn outbound_state_change_serialises_with_camel_case_keys_and_screaming_snake_type() {
    let frame = OutboundFrame::StateChange {
        machine_id: "call-1".to_string(),
        state_before: "RINGING".to_string(),
        state_after: "CONNECTED".to_string(),
        event_name: "ANSWER".to_string(),
        payload: serde_json::Value::Null,
        context: serde_json::json!({"id": "call-1"}),
        timestamp: 1000,
        entry_action_status: EntryActionStatus::Ok,
    };
    let value = serde_json::to_value(&frame).expect("serialise");
    assert_eq!(value["type"], "STATE_CHANGE");
    assert_eq!(value["machineId"], "call-1");
    assert_eq!(value["stateBefore"], "RINGING");
    assert_eq!(value["entryActionStatus"], "OK");
}

#[test]
fn machine_unregistered_omits_machine_type_when_absent() {
    let frame = OutboundFrame::MachineUnregistered { machine_id: "call-1".to_string(), machine_type: None };
    let value = serde_json::to_value(&frame).expect("serialise");
    assert!(value.get("machineType").is_none());
}
