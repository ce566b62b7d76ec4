//! Axum session service for the add-item workflow.
//!
//! This crate provides:
//! - REST routes driving one `FlowSession` per client through upload,
//!   cutout, identification and save
//! - Wardrobe gallery, label vocabulary and outfit suggestion routes
//! - Security headers, request ids and Prometheus metrics
//! - A background reaper for idle sessions

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::SessionReaper;
pub use state::AppState;
