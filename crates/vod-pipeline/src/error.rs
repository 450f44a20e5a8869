//! Pipeline error types.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("conversion queue is closed")]
    QueueClosed,

    #[error("store error: {0}")]
    Store(#[from] vod_store::StoreError),

    #[error("media error: {0}")]
    Media(#[from] vod_media::MediaError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
