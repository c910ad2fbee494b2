use super::*;
use shared::domain::VoteEvent;

fn vote_event(line: &str) -> ServerEvent {
    ServerEvent::VoteReceived(VoteEvent::parse_line(line).expect("vote"))
}

#[test]
fn publish_without_clients_is_not_an_error() {
    let hub = BroadcastHub::new(4);
    assert_eq!(hub.client_count(), 0);
    assert_eq!(hub.publish(vote_event(r#"{"id":1,"voto":1}"#)), 0);
}

#[tokio::test]
async fn every_subscriber_receives_each_event() {
    let hub = BroadcastHub::new(4);
    let mut first = hub.subscribe();
    let mut second = hub.subscribe();
    assert_eq!(hub.client_count(), 2);

    let event = vote_event(r#"{"id":5,"voto":0}"#);
    assert_eq!(hub.publish(event.clone()), 2);
    assert_eq!(first.recv().await.expect("first"), event);
    assert_eq!(second.recv().await.expect("second"), event);
}

#[tokio::test]
async fn late_subscriber_gets_no_history() {
    let hub = BroadcastHub::new(4);
    let _early = hub.subscribe();
    hub.publish(vote_event(r#"{"id":1,"voto":1}"#));

    let mut late = hub.subscribe();
    assert!(matches!(
        late.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    ));
}
