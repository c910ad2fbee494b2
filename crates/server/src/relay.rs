use shared::{
    domain::VoteEvent,
    protocol::{ClientCommand, ServerEvent},
};
use storage::LogWriter;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::{hub::BroadcastHub, serial::SerialHandle};

/// Single coordinator between the serial link, the vote log and the hub.
///
/// Votes and client commands are handled one at a time in arrival order.
/// Neither side effect of a vote waits on the other: the log append is
/// queued for the writer task and the broadcast never blocks.
pub struct Relay {
    log: LogWriter,
    hub: BroadcastHub,
    serial: SerialHandle,
}

impl Relay {
    pub fn new(log: LogWriter, hub: BroadcastHub, serial: SerialHandle) -> Self {
        Self { log, hub, serial }
    }

    /// Runs until both queues are closed.
    pub async fn run(
        self,
        mut votes: mpsc::Receiver<VoteEvent>,
        mut commands: mpsc::Receiver<ClientCommand>,
    ) {
        let mut votes_open = true;
        let mut commands_open = true;

        loop {
            tokio::select! {
                vote = votes.recv(), if votes_open => match vote {
                    Some(vote) => self.dispatch_vote(vote),
                    None => {
                        debug!("serial vote queue closed");
                        votes_open = false;
                    }
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.dispatch_command(command),
                    None => {
                        debug!("client command queue closed");
                        commands_open = false;
                    }
                },
                else => break,
            }
        }

        debug!("relay stopped");
    }

    fn dispatch_vote(&self, vote: VoteEvent) {
        self.log.submit(vote.clone());
        let receivers = self.hub.publish(ServerEvent::VoteReceived(vote));
        debug!(receivers, "vote broadcast");
    }

    fn dispatch_command(&self, command: ClientCommand) {
        info!(
            ?command,
            device_connected = self.serial.is_connected(),
            "client command received"
        );
        self.serial.send_command(command.device_command());
    }
}

#[cfg(test)]
#[path = "tests/relay_tests.rs"]
mod tests;
