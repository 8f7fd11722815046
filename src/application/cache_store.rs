// Storage trait for rendered chart images
use crate::domain::cache_key::CacheKey;
use crate::domain::session::RenderGroupId;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Existence-based image cache. Entries are written through `stage` + `commit`
/// so a reader never observes a partially written image.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Final location of the entry for `key`.
    fn locate(&self, key: &CacheKey) -> PathBuf;

    async fn exists(&self, key: &CacheKey) -> bool;

    async fn open(&self, key: &CacheKey) -> io::Result<Vec<u8>>;

    /// Reserves a unique scratch path the renderer may write to.
    async fn stage(&self, key: &CacheKey) -> io::Result<PathBuf>;

    /// Atomically moves a staged file into place and returns the final path.
    async fn commit(&self, key: &CacheKey, staged: &Path) -> io::Result<PathBuf>;

    async fn discard(&self, staged: &Path);

    /// Removes every entry belonging to `group_id`; returns how many were removed.
    async fn invalidate_namespace(&self, group_id: &RenderGroupId) -> io::Result<usize>;
}
