// External chart renderer capability
use crate::domain::cache_key::CacheKey;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer unavailable: {0}")]
    NotFound(io::Error),
    #[error("renderer i/o failed: {0}")]
    Io(io::Error),
    #[error("renderer exited with {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("renderer produced no image at {0}")]
    MissingOutput(PathBuf),
    #[error("renderer timed out after {0:?}")]
    Timeout(Duration),
}

/// Parameters for one render. `output` is a staging path; the cache commits it
/// under the key's final name after the renderer returns.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub key: CacheKey,
    pub merged_log: Option<PathBuf>,
    pub output: PathBuf,
}

#[async_trait]
pub trait ChartRenderer: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<(), RenderError>;
}
