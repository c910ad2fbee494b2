use super::*;
use serde_json::json;

#[test]
fn vote_event_is_published_as_nuevo_voto() {
    let vote = VoteEvent::parse_line(r#"{"id":101,"voto":1}"#).expect("vote");
    let value = serde_json::to_value(ServerEvent::VoteReceived(vote)).expect("json");
    assert_eq!(value, json!({ "event": "nuevo-voto", "data": { "id": 101, "voto": 1 } }));
}

#[test]
fn client_commands_parse_from_envelope_or_bare_name() {
    assert_eq!(
        ClientCommand::parse(r#"{"event":"start-flood"}"#),
        Some(ClientCommand::StartFlood)
    );
    assert_eq!(
        ClientCommand::parse(r#"{"event":"stop-flood","data":null}"#),
        Some(ClientCommand::StopFlood)
    );
    assert_eq!(ClientCommand::parse(" start-flood\n"), Some(ClientCommand::StartFlood));
    assert_eq!(ClientCommand::parse(r#"{"event":"reboot"}"#), None);
    assert_eq!(ClientCommand::parse("hello"), None);
}

#[test]
fn flood_commands_map_to_device_wire_strings() {
    assert_eq!(ClientCommand::StartFlood.device_command().as_wire(), "START\n");
    assert_eq!(ClientCommand::StopFlood.device_command().as_wire(), "STOP\n");
}
