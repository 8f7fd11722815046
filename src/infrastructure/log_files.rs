// File-based log merge: settled + pending sensor logs into a per-request file
use crate::application::log_merge::{LogMerger, MergeError, MergedLog};
use crate::domain::chart::Category;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileLogMerger {
    log_dir: PathBuf,
    tmp_dir: PathBuf,
}

impl FileLogMerger {
    pub fn new(log_dir: PathBuf, tmp_dir: PathBuf) -> Self {
        Self { log_dir, tmp_dir }
    }

    fn settled_path(&self, category: Category) -> PathBuf {
        self.log_dir.join(format!("sensor-{}.log", category.tag()))
    }

    fn pending_path(&self, category: Category) -> PathBuf {
        self.log_dir.join(format!("sensor-{}-tmp.log", category.tag()))
    }
}

#[async_trait]
impl LogMerger for FileLogMerger {
    async fn merge(&self, category: Category) -> Result<MergedLog, MergeError> {
        let target = self.tmp_dir.join(format!(
            "sensor-{}-logs-{}.log",
            category.tag(),
            Uuid::new_v4().simple()
        ));
        let write_err = |source: std::io::Error| MergeError::Write {
            path: target.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.tmp_dir)
            .await
            .map_err(write_err)?;
        let mut out = tokio::fs::File::create(&target).await.map_err(write_err)?;
        // From here on a failed merge drops the handle, which removes the partial file.
        let merged = MergedLog::new(category, target.clone());

        let mut bytes = 0;
        for source_path in [self.settled_path(category), self.pending_path(category)] {
            let mut input = tokio::fs::File::open(&source_path)
                .await
                .map_err(|source| MergeError::Source {
                    path: source_path.clone(),
                    source,
                })?;
            bytes += tokio::io::copy(&mut input, &mut out)
                .await
                .map_err(|source| MergeError::Source {
                    path: source_path.clone(),
                    source,
                })?;
        }
        out.flush().await.map_err(write_err)?;

        tracing::debug!(
            op = "log_merge::merge",
            %category,
            bytes,
            path = %target.display(),
            "Sensor logs merged"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileLogMerger) {
        let dir = TempDir::new().expect("temp dir");
        let logs = dir.path().join("log");
        std::fs::create_dir_all(&logs).expect("mkdir");
        let merger = FileLogMerger::new(logs, dir.path().join("tmp"));
        (dir, merger)
    }

    #[tokio::test]
    async fn test_concatenates_settled_then_pending() {
        let (dir, merger) = setup();
        std::fs::write(dir.path().join("log/sensor-ht.log"), "1 old\n").unwrap();
        std::fs::write(dir.path().join("log/sensor-ht-tmp.log"), "2 new\n").unwrap();

        let merged = merger.merge(Category::HumidityTemperature).await.expect("merge");
        let content = std::fs::read_to_string(merged.path()).expect("read");
        assert_eq!(content, "1 old\n2 new\n");

        let path = merged.path().to_path_buf();
        merger.release(merged).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_source_leaves_no_file() {
        let (dir, merger) = setup();
        std::fs::write(dir.path().join("log/sensor-co2.log"), "1\n").unwrap();

        let err = merger.merge(Category::Co2).await.expect_err("pending log missing");
        assert!(matches!(err, MergeError::Source { .. }));
        let leftovers = std::fs::read_dir(dir.path().join("tmp")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_each_merge_gets_its_own_file() {
        let (dir, merger) = setup();
        std::fs::write(dir.path().join("log/sensor-t.log"), "a\n").unwrap();
        std::fs::write(dir.path().join("log/sensor-t-tmp.log"), "b\n").unwrap();

        let (a, b) = tokio::join!(
            merger.merge(Category::Temperature),
            merger.merge(Category::Temperature)
        );
        let (a, b) = (a.expect("merge a"), b.expect("merge b"));
        assert_ne!(a.path(), b.path());
        assert_eq!(std::fs::read_to_string(a.path()).unwrap(), "a\nb\n");
        assert_eq!(std::fs::read_to_string(b.path()).unwrap(), "a\nb\n");
    }
}
