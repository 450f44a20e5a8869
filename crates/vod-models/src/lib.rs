//! Shared data models for the vodhost backend.
//!
//! The central entity is [`Video`], which moves through the upload →
//! processing → complete/interrupted → archived lifecycle. Everything here is
//! plain data; behavior lives in the store, pipeline, and api crates.

pub mod list;
pub mod slug;
pub mod video;

pub use list::{ListFilter, ListPayload, Pagination};
pub use slug::random_slug;
pub use video::{Video, VideoId, VideoStatus};
