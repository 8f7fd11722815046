// Disk-backed image cache
use crate::application::cache_store::CacheStore;
use crate::domain::cache_key::CacheKey;
use crate::domain::session::RenderGroupId;
use async_trait::async_trait;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Renders land in this subdirectory first. The retention sweeper never
/// descends into subdirectories, so in-progress writes are never swept.
const STAGING_DIR: &str = ".staging";

#[derive(Debug, Clone)]
pub struct DiskCacheStore {
    root: PathBuf,
    staging: PathBuf,
}

impl DiskCacheStore {
    /// Creates the cache directories and clears staged renders left behind by
    /// a previous process.
    pub fn new(root: PathBuf) -> io::Result<Self> {
        let staging = root.join(STAGING_DIR);
        std::fs::create_dir_all(&staging)?;
        let store = Self { root, staging };
        store.clear_staging()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn clear_staging(&self) -> io::Result<()> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.staging)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        op = "disk_cache::clear_staging",
                        path = %path.display(),
                        error = %err,
                        "Failed to remove stale staged render"
                    );
                }
            }
        }
        if removed > 0 {
            tracing::info!(
                op = "disk_cache::clear_staging",
                removed,
                "Removed staged renders from a previous run"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    fn locate(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    async fn exists(&self, key: &CacheKey) -> bool {
        tokio::fs::metadata(self.locate(key))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn open(&self, key: &CacheKey) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.locate(key)).await
    }

    async fn stage(&self, key: &CacheKey) -> io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.staging).await?;
        Ok(self.staging.join(format!(
            "{}.{}.tmp",
            key.file_name(),
            Uuid::new_v4().simple()
        )))
    }

    async fn commit(&self, key: &CacheKey, staged: &Path) -> io::Result<PathBuf> {
        let target = self.locate(key);
        tokio::fs::rename(staged, &target).await?;
        Ok(target)
    }

    async fn discard(&self, staged: &Path) {
        match tokio::fs::remove_file(staged).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    op = "disk_cache::discard",
                    path = %staged.display(),
                    error = %err,
                    "Failed to remove staged render"
                );
            }
        }
    }

    async fn invalidate_namespace(&self, group_id: &RenderGroupId) -> io::Result<usize> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(CacheKey::from_file_name) else {
                continue;
            };
            if !key.in_namespace(group_id) {
                continue;
            }
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        op = "disk_cache::invalidate_namespace",
                        path = %entry.path().display(),
                        error = %err,
                        "Failed to remove cached image"
                    );
                }
            }
        }
        tracing::debug!(
            op = "disk_cache::invalidate_namespace",
            %group_id,
            removed,
        );
        Ok(removed)
    }
}
