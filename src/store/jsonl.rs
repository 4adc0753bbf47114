//! JSON-lines session store.
//!
//! One serialized [`SessionSummary`] per line, appended by a dedicated task.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::common::error::StoreError;
use crate::common::messages::SessionSummary;
use crate::store::SessionStore;

/// Store that queues summaries for [`run_store_writer`].
#[derive(Debug, Clone)]
pub struct ChannelSessionStore {
    tx: mpsc::UnboundedSender<SessionSummary>,
}

impl ChannelSessionStore {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SessionStore for ChannelSessionStore {
    fn persist(&self, summary: SessionSummary) -> Result<(), StoreError> {
        self.tx.send(summary).map_err(|_| StoreError::Closed)
    }
}

/// Appends summaries to a JSON-lines file.
#[derive(Debug, Clone)]
pub struct JsonlWriter {
    path: PathBuf,
}

impl JsonlWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, summary: &SessionSummary) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(summary)?;
        line.push('\n');

        let io_error = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;
        file.write_all(line.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        Ok(())
    }
}

/// Drain queued summaries into `writer` until every sender is dropped.
pub async fn run_store_writer(mut rx: mpsc::UnboundedReceiver<SessionSummary>, writer: JsonlWriter) {
    while let Some(summary) = rx.recv().await {
        match writer.append(&summary).await {
            Ok(()) => info!(
                subject = summary.subject_id,
                net = summary.net_gain,
                "Persisted session to {}",
                writer.path().display()
            ),
            Err(e) => error!("Failed to persist session for {}: {}", summary.subject_id, e),
        }
    }
    info!("Session store writer ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn summary(subject_id: u64, gain: u64, loss: u64) -> SessionSummary {
        SessionSummary {
            subject_id,
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            ended_at: Utc.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap(),
            total_gain: gain,
            total_loss: loss,
            net_gain: gain as i64 - loss as i64,
            bets_resolved: 3,
        }
    }

    #[test]
    fn test_closed_store_reports_error() {
        let (store, rx) = ChannelSessionStore::new();
        drop(rx);
        assert!(matches!(store.persist(summary(1, 0, 0)), Err(StoreError::Closed)));
    }

    #[test]
    fn test_writer_appends_lines() {
        let path = std::env::temp_dir().join(format!(
            "winningtrack-store-test-{}.jsonl",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let (store, rx) = ChannelSessionStore::new();
        store.persist(summary(1, 500, 200)).unwrap();
        store.persist(summary(2, 0, 1000)).unwrap();
        drop(store);

        tokio_test::block_on(run_store_writer(rx, JsonlWriter::new(&path)));

        let content = std::fs::read_to_string(&path).unwrap();
        let records: Vec<SessionSummary> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(records, vec![summary(1, 500, 200), summary(2, 0, 1000)]);
    }
}
