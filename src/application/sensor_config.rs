// Repository trait for the read-only sensor configuration
use crate::domain::chart::Category;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorConfigError {
    #[error("failed to read sensor configuration: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse sensor configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[async_trait]
pub trait SensorConfigRepository: Send + Sync {
    /// Ordered "graph enabled" flags for every series of a category.
    /// A category with no configured sensors yields an empty list.
    /// The list length is the category's series count.
    async fn graph_flags(&self, category: Category) -> Result<Vec<bool>, SensorConfigError>;
}
