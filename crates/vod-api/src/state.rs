//! Application state.

use std::sync::Arc;

use vod_pipeline::ConversionHandle;
use vod_store::VideoRepository;

use crate::config::AppConfig;
use crate::service::VideoService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: VideoService,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, repo: VideoRepository, queue: ConversionHandle) -> Self {
        let service = VideoService::new(repo, queue, config.clone());
        Self { config, service }
    }
}
