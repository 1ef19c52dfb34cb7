//! Append-only JSON lines journal of recorded exchanges.

use std::path::PathBuf;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::store::recent::RecentRequestEntry;

/// Handle to a background writer appending one JSON object per line.
#[derive(Debug, Clone)]
pub struct Journal {
    tx: mpsc::UnboundedSender<String>,
    path: PathBuf,
}

impl Journal {
    /// Start the writer task. Must be called from within a Tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_lines(path.clone(), rx));
        Self { tx, path }
    }

    /// Queue an entry. Never blocks; failures are logged only.
    pub fn append(&self, entry: &RecentRequestEntry) {
        match serde_json::to_string(entry) {
            Ok(line) => {
                if self.tx.send(line).is_err() {
                    tracing::debug!(path = ?self.path, "Journal writer stopped, dropping entry");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize journal entry"),
        }
    }
}

async fn write_lines(path: PathBuf, mut rx: mpsc::UnboundedReceiver<String>) {
    let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Failed to open journal file");
            return;
        }
    };
    tracing::info!(path = ?path, "Journal writer started");

    while let Some(mut line) = rx.recv().await {
        line.push('\n');
        if let Err(e) = file.write_all(line.as_bytes()).await {
            tracing::warn!(path = ?path, error = %e, "Failed to append journal entry");
            continue;
        }
        if let Err(e) = file.flush().await {
            tracing::warn!(path = ?path, error = %e, "Failed to flush journal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::recent::test_entry;
    use std::time::Duration;

    #[tokio::test]
    async fn test_appends_json_lines() {
        let path = std::env::temp_dir().join(format!("gateway-journal-{}.jsonl", uuid::Uuid::new_v4()));
        let journal = Journal::spawn(&path);
        journal.append(&test_entry("first"));
        journal.append(&test_entry("second"));

        let mut lines = Vec::new();
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let content = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            lines = content.lines().map(str::to_string).collect();
            if lines.len() == 2 {
                break;
            }
        }

        assert_eq!(lines.len(), 2);
        let first: RecentRequestEntry = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first.id, "first");
        let _ = tokio::fs::remove_file(&path).await;
    }
}
