//! Pipeline configuration.

use std::path::PathBuf;

/// Conversion pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrency ceiling for per-video workflows
    pub parallel: usize,
    /// Capacity of the conversion queue; a full queue blocks enqueuers
    pub queue_capacity: usize,
    /// Root of raw uploads (`<raw_dir>/<YYYY/MM/DD>/<slug>/source.<ext>`)
    pub raw_dir: PathBuf,
    /// Root of converted output (`<converted_dir>/<YYYY/MM/DD>/<slug>/`)
    pub converted_dir: PathBuf,
    /// Scratch root; each job works under `<work_dir>/<slug>/`
    pub work_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: 4,
            queue_capacity: 256,
            raw_dir: PathBuf::from("/data/raw"),
            converted_dir: PathBuf::from("/data/converted"),
            work_dir: PathBuf::from("/data/tmp/work"),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            parallel: std::env::var("PARALLEL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
            queue_capacity: std::env::var("QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
            raw_dir: std::env::var("RAW_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data/raw")),
            converted_dir: std::env::var("CONV_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data/converted")),
            work_dir: std::env::var("TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data/tmp/work")),
        }
    }
}
