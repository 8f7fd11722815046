// Sensor configuration read from a TOML file
use crate::application::sensor_config::{SensorConfigError, SensorConfigRepository};
use crate::domain::chart::Category;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default)]
struct SensorFile {
    #[serde(default)]
    graph: HashMap<String, Vec<bool>>,
}

/// Re-reads the file on every query so edits apply without a restart.
#[derive(Debug, Clone)]
pub struct FileSensorRepository {
    path: PathBuf,
}

impl FileSensorRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SensorConfigRepository for FileSensorRepository {
    async fn graph_flags(&self, category: Category) -> Result<Vec<bool>, SensorConfigError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let file: SensorFile = toml::from_str(&text)?;
        Ok(file
            .graph
            .get(category.config_key())
            .cloned()
            .unwrap_or_default())
    }
}
