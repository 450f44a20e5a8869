//! Axum HTTP surface for the vodhost backend.
//!
//! Thin by design: handlers parse and shape, [`VideoService`] holds the
//! policy, and everything below (repository, cache, pipeline, packager) lives
//! in the sibling crates.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use service::{VideoDto, VideoService};
pub use state::AppState;
