use serde::{Deserialize, Serialize};

use crate::domain::VoteEvent;

/// Events pushed to real-time clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "nuevo-voto")]
    VoteReceived(VoteEvent),
}

/// Control signals a real-time client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientCommand {
    #[serde(rename = "start-flood")]
    StartFlood,
    #[serde(rename = "stop-flood")]
    StopFlood,
}

impl ClientCommand {
    /// Accepts either the JSON envelope or the bare event name.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "start-flood" => Some(Self::StartFlood),
            "stop-flood" => Some(Self::StopFlood),
            other => serde_json::from_str(other).ok(),
        }
    }

    pub fn device_command(self) -> DeviceCommand {
        match self {
            Self::StartFlood => DeviceCommand::Start,
            Self::StopFlood => DeviceCommand::Stop,
        }
    }
}

/// Commands written to the device over the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Start,
    Stop,
}

impl DeviceCommand {
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Start => "START\n",
            Self::Stop => "STOP\n",
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
