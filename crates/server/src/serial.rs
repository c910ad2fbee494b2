use std::io::ErrorKind;

use shared::{domain::VoteEvent, protocol::DeviceCommand};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, warn};

pub const DEFAULT_BAUD_RATE: u32 = 115_200;

const READ_CHUNK_BYTES: usize = 1024;
const MAX_PENDING_BYTES: usize = 64 * 1024;
const COMMAND_QUEUE_CAPACITY: usize = 32;

pub fn open_serial_port(path: &str, baud_rate: u32) -> tokio_serial::Result<SerialStream> {
    tokio_serial::new(path, baud_rate).open_native_async()
}

/// Splits a byte stream into `\r\n`-terminated lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
}

impl LineFramer {
    /// Feeds `bytes` and returns every line completed by them, without the
    /// terminator. A bare `\n` stays part of the line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = find_crlf(&self.pending[start..]) {
            let end = start + offset;
            lines.push(String::from_utf8_lossy(&self.pending[start..end]).into_owned());
            start = end + 2;
        }
        self.pending.drain(..start);

        if self.pending.len() > MAX_PENDING_BYTES {
            warn!(
                bytes = self.pending.len(),
                "serial input has no line terminator; discarding buffer"
            );
            self.pending.clear();
        }

        lines
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(2).position(|pair| pair == b"\r\n")
}

/// Outbound side of the serial link. Without an open port every command is
/// dropped with a log line and the caller never sees an error.
#[derive(Debug, Clone)]
pub struct SerialHandle {
    commands: Option<mpsc::Sender<String>>,
}

impl SerialHandle {
    pub fn disconnected() -> Self {
        Self { commands: None }
    }

    pub fn is_connected(&self) -> bool {
        self.commands
            .as_ref()
            .is_some_and(|commands| !commands.is_closed())
    }

    pub fn send_command(&self, command: DeviceCommand) {
        self.send_raw(command.as_wire());
    }

    /// Queues the literal bytes of `raw` for the device.
    pub fn send_raw(&self, raw: &str) {
        let command = raw.trim_end();
        let Some(commands) = &self.commands else {
            warn!(command, "no serial port open; command not sent");
            return;
        };

        match commands.try_send(raw.to_owned()) {
            Ok(()) => debug!(command, "command queued for serial port"),
            Err(TrySendError::Full(_)) => {
                warn!(command, "serial command queue is full; command not sent")
            }
            Err(TrySendError::Closed(_)) => {
                warn!(command, "serial link is closed; command not sent")
            }
        }
    }
}

/// Starts the reader and writer tasks for an open serial stream.
///
/// Parsed votes go to `votes`; the returned handle feeds the writer. The
/// join handle resolves when the reader stops (end of stream or I/O error).
pub fn spawn_serial_link<S>(
    stream: S,
    votes: mpsc::Sender<VoteEvent>,
) -> (SerialHandle, JoinHandle<()>)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

    tokio::spawn(write_loop(writer, commands_rx));
    let reader_task = tokio::spawn(read_loop(reader, votes));

    (
        SerialHandle {
            commands: Some(commands_tx),
        },
        reader_task,
    )
}

async fn read_loop<R>(mut reader: R, votes: mpsc::Sender<VoteEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut framer = LineFramer::default();
    let mut chunk = [0u8; READ_CHUNK_BYTES];

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => {
                warn!("serial port closed; no more votes will be received");
                break;
            }
            Ok(read) => read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => {
                error!(%error, "serial port read failed; no more votes will be received");
                break;
            }
        };

        for line in framer.push(&chunk[..read]) {
            match VoteEvent::parse_line(&line) {
                Ok(vote) => {
                    info!(id = ?vote.id(), voto = ?vote.voto(), "vote received");
                    if votes.send(vote).await.is_err() {
                        debug!("relay is gone; serial reader stopping");
                        return;
                    }
                }
                Err(error) => warn!(%error, %line, "discarding malformed serial line"),
            }
        }
    }

    if framer.pending_len() > 0 {
        debug!(
            bytes = framer.pending_len(),
            "dropping unterminated serial input"
        );
    }
}

async fn write_loop<W>(mut writer: W, mut commands: mpsc::Receiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(raw) = commands.recv().await {
        let command = raw.trim_end();
        match write_command(&mut writer, &raw).await {
            Ok(()) => info!(command, "command sent to device"),
            Err(error) => error!(command, %error, "failed to write command to serial port"),
        }
    }
}

async fn write_command<W>(writer: &mut W, raw: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(raw.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
#[path = "tests/serial_tests.rs"]
mod tests;
