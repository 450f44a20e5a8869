//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vod_api::{create_router, AppConfig, AppState};
use vod_media::{FfmpegPackager, HlsSettings};
use vod_pipeline::ConversionPipeline;
use vod_store::{MemoryStore, VideoCache, VideoRepository};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Arc::new(AppConfig::from_env());
    info!(host = %config.host, port = config.port, "starting vod-api");

    // Storage stack: backing store, cache, repository.
    let cache = Arc::new(VideoCache::new(config.cache.clone()));
    let sweeper = cache.spawn_sweeper();
    let store = Arc::new(MemoryStore::new());
    let repo = VideoRepository::new(store, Arc::clone(&cache));

    // One shutdown signal for the pipeline and any in-flight ffmpeg runs.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let packager =
        Arc::new(FfmpegPackager::new(HlsSettings::default()).with_cancel(shutdown_rx.clone()));
    let (pipeline, queue) = ConversionPipeline::new(config.pipeline.clone(), repo.clone(), packager);
    let pipeline_task = tokio::spawn(pipeline.run(shutdown_rx));

    let state = AppState::new(Arc::clone(&config), repo, queue);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid bind address");
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    // Drain: broadcast shutdown, stop the cache sweeper, give the pipeline a
    // bounded window to wind down.
    let _ = shutdown_tx.send(true);
    cache.stop();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }
    if tokio::time::timeout(Duration::from_secs(30), pipeline_task)
        .await
        .is_err()
    {
        warn!("pipeline did not stop within 30s, exiting anyway");
    }

    info!("Server shutdown complete");
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vod=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
