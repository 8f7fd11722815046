// Application layer - Use cases and the traits they depend on
pub mod cache_store;
pub mod graph_service;
pub mod log_merge;
pub mod preferences;
pub mod render_cache;
pub mod renderer;
pub mod retention;
pub mod sensor_config;
