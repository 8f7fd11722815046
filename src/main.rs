// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::graph_service::GraphService;
use crate::application::render_cache::{RenderCache, RenderPolicy};
use crate::application::retention::RetentionSweeper;
use crate::infrastructure::command_renderer::CommandRenderer;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::disk_cache::DiskCacheStore;
use crate::infrastructure::log_files::FileLogMerger;
use crate::infrastructure::sensor_file::FileSensorRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{change_preferences, get_image, health_check, list_graphs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Infrastructure adapters
    let store = Arc::new(DiskCacheStore::new(config.paths.image_dir.clone())?);
    let renderer = Arc::new(CommandRenderer::new(
        config.renderer.program.clone(),
        config.renderer.args.clone(),
    ));
    let merger = Arc::new(FileLogMerger::new(
        config.paths.log_dir.clone(),
        config.paths.tmp_dir.clone(),
    ));
    let sensors = Arc::new(FileSensorRepository::new(config.sensors.config_file.clone()));

    // Services (application layer)
    let cache = Arc::new(RenderCache::new(
        store.clone(),
        renderer,
        RenderPolicy {
            timeout: config.renderer.timeout(),
            failure_backoff: config.renderer.failure_backoff(),
        },
    ));
    let graph_service = GraphService::new(sensors, merger, cache);

    // Retention runs on its own schedule, independent of requests
    let sweeper = RetentionSweeper::new(store.root().to_path_buf(), config.retention.keep);
    let _sweeper_task = sweeper.spawn(config.retention.interval());

    let state = Arc::new(AppState {
        graph_service,
        session_max_age_days: config.session.max_age_days,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/graphs", get(list_graphs))
        .route("/graphs/preferences", post(change_preferences))
        .route("/images/:file", get(get_image))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind.parse()?;
    tracing::info!("Starting sensor-graphs service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
