//! API configuration.

use std::path::PathBuf;

use vod_pipeline::PipelineConfig;
use vod_store::CacheConfig;

/// API server configuration, plus the configs of the subsystems the binary
/// wires together.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Public URL prefix under which converted artifacts are served,
    /// e.g. `/media` or `https://cdn.example.com/media`
    pub public_media_url: String,
    /// Directory archived raw sources are relocated into
    pub archive_dir: PathBuf,
    /// Length of generated video slugs
    pub slug_length: usize,
    /// Max request body size (uploads are the largest bodies)
    pub max_body_size: usize,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_media_url: "/media".to_string(),
            archive_dir: PathBuf::from("/data/archive"),
            slug_length: 12,
            max_body_size: 4 * 1024 * 1024 * 1024, // 4GB
            cache: CacheConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            public_media_url: std::env::var("PUBLIC_MEDIA_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "/media".to_string()),
            archive_dir: std::env::var("ARCHIVE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/data/archive")),
            slug_length: std::env::var("SLUG_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(12),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4 * 1024 * 1024 * 1024),
            cache: CacheConfig::from_env(),
            pipeline: PipelineConfig::from_env(),
        }
    }
}
