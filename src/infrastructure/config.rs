use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_BASENAME: &str = "config/graphs";
const ENV_PREFIX: &str = "GRAPHS";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub paths: PathSettings,
    pub renderer: RendererSettings,
    #[serde(default)]
    pub retention: RetentionSettings,
    #[serde(default)]
    pub session: SessionSettings,
    pub sensors: SensorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathSettings {
    /// Directory holding settled and pending sensor logs.
    pub log_dir: PathBuf,
    /// Scratch directory for merged logs.
    pub tmp_dir: PathBuf,
    pub image_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RendererSettings {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_failure_backoff_secs")]
    pub failure_backoff_secs: u64,
}

impl RendererSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetentionSettings {
    pub keep: usize,
    pub interval_secs: u64,
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            keep: 40,
            interval_secs: 300,
        }
    }
}

impl RetentionSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    pub max_age_days: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { max_age_days: 10 }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SensorSettings {
    pub config_file: PathBuf,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_failure_backoff_secs() -> u64 {
    30
}

/// Loads `config/graphs.*`, overridden by `GRAPHS__SECTION__KEY` environment variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    build_config(config::File::with_name(CONFIG_BASENAME))
}

fn build_config<S>(file: S) -> anyhow::Result<AppConfig>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
