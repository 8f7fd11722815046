// Render cache - Existence-based image cache in front of the external renderer
use crate::application::cache_store::CacheStore;
use crate::application::renderer::{ChartRenderer, RenderError, RenderRequest};
use crate::domain::cache_key::CacheKey;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// An image already existed; no render was attempted.
    Hit,
    /// The renderer ran and its image was committed.
    Rendered,
    Failed,
    /// The key failed recently and is cooling down.
    BackedOff,
}

impl CacheOutcome {
    pub fn has_image(self) -> bool {
        matches!(self, CacheOutcome::Hit | CacheOutcome::Rendered)
    }
}

#[derive(Debug, Clone)]
pub struct Ensured {
    pub path: PathBuf,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderPolicy {
    pub timeout: Duration,
    pub failure_backoff: Duration,
}

pub struct RenderCache {
    store: Arc<dyn CacheStore>,
    renderer: Arc<dyn ChartRenderer>,
    policy: RenderPolicy,
    in_flight: DashMap<CacheKey, Arc<Mutex<()>>>,
    failures: DashMap<CacheKey, Instant>,
}

impl RenderCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        renderer: Arc<dyn ChartRenderer>,
        policy: RenderPolicy,
    ) -> Self {
        Self {
            store,
            renderer,
            policy,
            in_flight: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Returns the entry for `key`, rendering it first if it does not exist.
    /// At most one render per key runs at a time; waiters re-check existence
    /// once the in-flight render finishes.
    pub async fn ensure(&self, key: &CacheKey, merged_log: Option<&Path>) -> Ensured {
        let path = self.store.locate(key);
        if self.store.exists(key).await {
            tracing::debug!(
                op = "render_cache::ensure",
                result = "cache_hit",
                cache_path = %path.display(),
            );
            return Ensured {
                path,
                outcome: CacheOutcome::Hit,
            };
        }

        let lock = self.in_flight.entry(key.clone()).or_default().clone();
        let outcome = {
            let _guard = lock.lock().await;
            if self.store.exists(key).await {
                CacheOutcome::Hit
            } else if self.in_backoff(key) {
                tracing::debug!(
                    op = "render_cache::ensure",
                    result = "backed_off",
                    cache_path = %path.display(),
                );
                CacheOutcome::BackedOff
            } else {
                self.render(key, merged_log).await
            }
        };
        drop(lock);
        self.in_flight
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);

        Ensured { path, outcome }
    }

    async fn render(&self, key: &CacheKey, merged_log: Option<&Path>) -> CacheOutcome {
        let started_at = Instant::now();
        let staged = match self.store.stage(key).await {
            Ok(staged) => staged,
            Err(err) => {
                tracing::warn!(
                    op = "render_cache::render",
                    result = "error",
                    error_code = "stage",
                    key = %key.file_name(),
                    error = %err,
                    "Failed to reserve staging path"
                );
                self.record_failure(key);
                return CacheOutcome::Failed;
            }
        };

        let request = RenderRequest {
            key: key.clone(),
            merged_log: merged_log.map(Path::to_path_buf),
            output: staged.clone(),
        };
        let result = match tokio::time::timeout(self.policy.timeout, self.renderer.render(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(RenderError::Timeout(self.policy.timeout)),
        };
        let committed = match result {
            Ok(()) => self.store.commit(key, &staged).await.map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    RenderError::MissingOutput(staged.clone())
                } else {
                    RenderError::Io(err)
                }
            }),
            Err(err) => Err(err),
        };

        match committed {
            Ok(path) => {
                self.failures.remove(key);
                tracing::info!(
                    op = "render_cache::render",
                    result = "cache_miss",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    cache_path = %path.display(),
                    "Chart rendered"
                );
                CacheOutcome::Rendered
            }
            Err(err) => {
                self.store.discard(&staged).await;
                self.record_failure(key);
                tracing::warn!(
                    op = "render_cache::render",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    key = %key.file_name(),
                    error = %err,
                    "Chart render failed"
                );
                CacheOutcome::Failed
            }
        }
    }

    fn in_backoff(&self, key: &CacheKey) -> bool {
        match self.failures.get(key).map(|failed_at| failed_at.elapsed()) {
            Some(elapsed) if elapsed < self.policy.failure_backoff => true,
            Some(_) => {
                self.failures.remove(key);
                false
            }
            None => false,
        }
    }

    fn record_failure(&self, key: &CacheKey) {
        let backoff = self.policy.failure_backoff;
        self.failures.retain(|_, failed_at| failed_at.elapsed() < backoff);
        self.failures.insert(key.clone(), Instant::now());
    }
}
