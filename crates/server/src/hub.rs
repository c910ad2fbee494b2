use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use shared::protocol::{ClientCommand, ServerEvent};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

/// Fan-out of vote events to the connected real-time clients.
///
/// Delivery is best effort: nothing is replayed to late joiners and a client
/// that falls behind skips what it missed.
#[derive(Clone)]
pub struct BroadcastHub {
    events: broadcast::Sender<ServerEvent>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self { events }
    }

    /// Returns how many clients the event was handed to.
    pub fn publish(&self, event: ServerEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.events.receiver_count()
    }
}

pub async fn serve_client(
    hub: BroadcastHub,
    commands: mpsc::Sender<ClientCommand>,
    socket: WebSocket,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = hub.subscribe();
    info!(clients = hub.client_count(), "real-time client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "real-time client fell behind; events skipped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(error) => {
                    warn!(%error, "failed to encode event for real-time client");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match ClientCommand::parse(&text) {
                Some(command) => {
                    if commands.send(command).await.is_err() {
                        warn!(?command, "relay is gone; client command dropped");
                    }
                }
                None => warn!(message = %text, "ignoring unknown client message"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    info!("real-time client disconnected");
}

#[cfg(test)]
#[path = "tests/hub_tests.rs"]
mod tests;
