use std::sync::Arc;

use shared::domain::{format_timestamp, VoteEvent};
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        oneshot,
    },
    task::JoinHandle,
};
use tracing::{debug, error, warn};

use crate::{Result, VoteLog};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

enum LogRequest {
    Append(VoteEvent),
    Reset(oneshot::Sender<Result<()>>),
}

/// Handle to the task that owns appends to a [`VoteLog`].
///
/// Submitting never waits on disk. Once every handle is dropped the task
/// drains what is queued and exits.
#[derive(Clone)]
pub struct LogWriter {
    tx: mpsc::Sender<LogRequest>,
    log: Arc<VoteLog>,
}

impl LogWriter {
    pub fn spawn(log: Arc<VoteLog>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<LogRequest>(capacity.max(1));
        let task_log = log.clone();
        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                match request {
                    LogRequest::Append(event) => append(&task_log, event).await,
                    LogRequest::Reset(reply) => {
                        let _ = reply.send(task_log.reset().await);
                    }
                }
            }
            debug!("vote log writer stopped");
        });
        (Self { tx, log }, task)
    }

    pub fn log(&self) -> &Arc<VoteLog> {
        &self.log
    }

    /// Queues `event` for appending. Returns false when the vote was dropped.
    pub fn submit(&self, event: VoteEvent) -> bool {
        match self.tx.try_send(LogRequest::Append(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(request)) => {
                warn!(id = ?request_id(&request), "vote log queue is full; vote not persisted");
                false
            }
            Err(TrySendError::Closed(request)) => {
                warn!(id = ?request_id(&request), "vote log writer is gone; vote not persisted");
                false
            }
        }
    }

    /// Clears the log behind every vote already queued, so nothing submitted
    /// before the call is written after it.
    pub async fn reset(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send(LogRequest::Reset(reply_tx)).await.is_err() {
            return self.log.reset().await;
        }
        match reply_rx.await {
            Ok(result) => result,
            Err(_) => self.log.reset().await,
        }
    }
}

fn request_id(request: &LogRequest) -> Option<i64> {
    match request {
        LogRequest::Append(event) => event.id(),
        LogRequest::Reset(_) => None,
    }
}

async fn append(log: &VoteLog, event: VoteEvent) {
    match log.append(event).await {
        Ok(logged) => debug!(
            id = ?logged.event.id(),
            received_at = %format_timestamp(&logged.received_at),
            "vote appended to log"
        ),
        Err(error) => error!(
            path = %log.path().display(),
            %error,
            "failed to append vote to log"
        ),
    }
}
