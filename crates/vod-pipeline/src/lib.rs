//! Asynchronous video conversion pipeline.
//!
//! A single dispatcher pulls slugs off a bounded queue and runs each
//! per-video workflow under a concurrency permit: resolve the record, mark it
//! processing, package it to HLS in a scratch directory, relocate the
//! artifacts, and mark it complete or interrupted. One job's failure never
//! stops the dispatcher.

pub mod config;
pub mod error;
pub mod pipeline;
pub(crate) mod workflow;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{ConversionHandle, ConversionPipeline};
