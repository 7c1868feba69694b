//! HTTP transport for the sentiment serving core

pub mod api;
pub mod config;

pub use api::{create_router, ApiError, AppState};
pub use config::{BackendKind, ServerConfig};
