// Domain layer - Chart keys, preferences and page models
pub mod cache_key;
pub mod chart;
pub mod page;
pub mod session;
