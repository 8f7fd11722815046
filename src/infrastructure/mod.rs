// Infrastructure layer - External dependencies and adapters
pub mod command_renderer;
pub mod config;
pub mod disk_cache;
pub mod log_files;
pub mod sensor_file;
