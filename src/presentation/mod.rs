// Presentation layer - HTTP handlers and cookie transport
pub mod app_state;
pub mod cookies;
pub mod handlers;
