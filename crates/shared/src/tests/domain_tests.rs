use super::*;
use chrono::TimeZone;
use serde_json::json;

#[test]
fn parses_device_line_and_keeps_extra_fields() {
    let event = VoteEvent::parse_line(r#"{"id":101,"voto":1,"rssi":-40}"#).expect("vote");
    assert_eq!(event.id(), Some(101));
    assert_eq!(event.voto(), Some(1));
    assert_eq!(event.get("rssi"), Some(&json!(-40)));
    let keys: Vec<&str> = event.fields().keys().map(String::as_str).collect();
    assert_eq!(keys, ["id", "voto", "rssi"]);
}

#[test]
fn rejects_invalid_json() {
    let err = VoteEvent::parse_line(r#"{"id":101,"voto":"#).expect_err("should fail");
    assert!(matches!(err, VoteParseError::Json(_)));
}

#[test]
fn rejects_json_that_is_not_an_object() {
    let err = VoteEvent::parse_line("42").expect_err("should fail");
    assert!(matches!(err, VoteParseError::NotAnObject("number")));
    let err = VoteEvent::parse_line("[1,2]").expect_err("should fail");
    assert!(matches!(err, VoteParseError::NotAnObject("array")));
}

#[test]
fn logged_vote_serializes_received_at_in_millis() {
    let event = VoteEvent::parse_line(r#"{"id":7,"voto":2}"#).expect("vote");
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let logged = LoggedVote::stamp(event, at);

    let line = serde_json::to_string(&logged).expect("json");
    assert_eq!(line, r#"{"id":7,"voto":2,"receivedAt":"2024-05-01T10:00:00.000Z"}"#);

    let back: LoggedVote = serde_json::from_str(&line).expect("parse");
    assert_eq!(back, logged);
    assert!(back.event.get(RECEIVED_AT_FIELD).is_none());
}

#[test]
fn stamp_replaces_device_supplied_received_at() {
    let event = VoteEvent::parse_line(r#"{"id":1,"receivedAt":"yesterday","voto":3,"rssi":-40}"#)
        .expect("vote");
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    let logged = LoggedVote::stamp(event, at);

    assert_eq!(
        logged.field(RECEIVED_AT_FIELD),
        Some(json!("2024-01-02T03:04:05.000Z"))
    );
    let line = serde_json::to_string(&logged).expect("json");
    assert_eq!(
        line,
        r#"{"id":1,"voto":3,"rssi":-40,"receivedAt":"2024-01-02T03:04:05.000Z"}"#
    );
}
