// Log merge stage - Settled + pending logs concatenated for one render pass
use crate::domain::chart::Category;
use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to read log {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write merged log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A merged log owned by one orchestration pass. The file is removed by
/// `release`, or on drop if the handle was never released.
#[derive(Debug)]
pub struct MergedLog {
    category: Category,
    path: PathBuf,
    released: bool,
}

impl MergedLog {
    pub fn new(category: Category, path: PathBuf) -> Self {
        Self {
            category,
            path,
            released: false,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn release(mut self) -> io::Result<()> {
        self.released = true;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Drop for MergedLog {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[async_trait]
pub trait LogMerger: Send + Sync {
    async fn merge(&self, category: Category) -> Result<MergedLog, MergeError>;

    async fn release(&self, log: MergedLog) {
        let category = log.category();
        let path = log.path().to_path_buf();
        if let Err(err) = log.release().await {
            tracing::warn!(
                op = "log_merge::release",
                %category,
                path = %path.display(),
                error = %err,
                "Failed to remove merged log"
            );
        }
    }
}
