// Retention sweeper - Bounds the image directory to the N most recently modified entries
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dir: PathBuf,
    keep: usize,
}

impl RetentionSweeper {
    pub fn new(dir: PathBuf, keep: usize) -> Self {
        Self { dir, keep }
    }

    /// Deletes every top-level entry except the `keep` most recently modified.
    /// Subdirectories are neither counted nor entered. Per-entry errors are
    /// logged and counted; the sweep carries on.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return report,
            Err(err) => {
                tracing::warn!(
                    op = "retention::sweep",
                    dir = %self.dir.display(),
                    error = %err,
                    "Failed to list image directory"
                );
                return report;
            }
        };

        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(op = "retention::sweep", error = %err, "Failed to read directory entry");
                    report.failed += 1;
                    break;
                }
            };
            let path = entry.path();
            let modified = match entry.metadata().await {
                Ok(meta) if meta.is_dir() => continue,
                Ok(meta) => meta.modified(),
                Err(err) => Err(err),
            };
            match modified {
                Ok(modified) => files.push((modified, path)),
                Err(err) => {
                    tracing::warn!(
                        op = "retention::sweep",
                        path = %path.display(),
                        error = %err,
                        "Failed to read modification time"
                    );
                    report.failed += 1;
                }
            }
        }

        report.scanned = files.len();
        if files.len() <= self.keep {
            return report;
        }

        files.sort();
        let excess = files.len() - self.keep;
        for (_, path) in files.into_iter().take(excess) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => report.removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        op = "retention::sweep",
                        path = %path.display(),
                        error = %err,
                        "Failed to remove expired image"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            op = "retention::sweep",
            dir = %self.dir.display(),
            scanned = report.scanned,
            removed = report.removed,
            failed = report.failed,
            "Image retention sweep finished"
        );
        report
    }

    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}
