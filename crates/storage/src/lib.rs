use anyhow::{Context, Result as AnyResult};
use chrono::{DateTime, Utc};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use shared::domain::{LoggedVote, VoteEvent};

mod csv;
mod writer;

pub use csv::{escape_field, render_csv, CSV_HEADER};
pub use writer::{LogWriter, DEFAULT_QUEUE_CAPACITY};

#[derive(Debug, Error)]
pub enum VoteLogError {
    #[error("vote log '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("vote log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("vote log line {line} is not a valid record: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode vote: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VoteLogError>;

/// Append-only NDJSON log of the votes received since the last reset.
///
/// Every file operation takes the same lock, so appends land in submission
/// order and a concurrent reset or export never sees a half-written line.
pub struct VoteLog {
    path: PathBuf,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl VoteLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_stamp: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leaves an empty log behind, creating the file when missing.
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.last_stamp.lock().await;
        tokio::fs::write(&self.path, b"").await?;
        Ok(())
    }

    pub async fn append(&self, event: VoteEvent) -> Result<LoggedVote> {
        self.append_at(event, Utc::now()).await
    }

    pub(crate) async fn append_at(
        &self,
        event: VoteEvent,
        now: DateTime<Utc>,
    ) -> Result<LoggedVote> {
        let mut last_stamp = self.last_stamp.lock().await;
        // A clock stepping backwards must not reorder the log.
        let received_at = match *last_stamp {
            Some(last) if last > now => last,
            _ => now,
        };
        let logged = LoggedVote::stamp(event, received_at);

        let mut line = serde_json::to_string(&logged)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        *last_stamp = Some(received_at);
        Ok(logged)
    }

    pub async fn read_all(&self) -> Result<Vec<LoggedVote>> {
        let _guard = self.last_stamp.lock().await;
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(VoteLogError::NotFound(self.path.clone()))
            }
            Err(error) => return Err(error.into()),
        };

        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| VoteLogError::Corrupt {
                    line: index + 1,
                    source,
                })
            })
            .collect()
    }

    pub async fn export_csv(&self) -> Result<String> {
        let votes = self.read_all().await?;
        Ok(render_csv(&votes))
    }
}

/// Creates the directory the log file lives in.
pub fn prepare_log_path(path: &Path) -> AnyResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for vote log '{}'",
            parent.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
