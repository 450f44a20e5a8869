//! Video service: upload intake, lifecycle policy, and response shaping.
//!
//! The repository guarantees storage discipline; this layer owns everything
//! above it: filename validation, slug generation, raw file placement,
//! duration probing, enqueueing, and the archive policy.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use vod_media::{move_file, probe_duration, MediaError};
use vod_models::{random_slug, ListFilter, ListPayload, Pagination, Video, VideoId, VideoStatus};
use vod_pipeline::ConversionHandle;
use vod_store::VideoRepository;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};

const MAX_FILENAME_LEN: usize = 200;

/// A video record as presented to API clients.
#[derive(Debug, Serialize)]
pub struct VideoDto {
    #[serde(flatten)]
    pub video: Video,
    /// Playback URL for the HLS playlist; present once conversion completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_url: Option<String>,
    /// Preview image URL; present once conversion completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Orchestrates uploads and lifecycle transitions on behalf of the handlers.
#[derive(Clone)]
pub struct VideoService {
    repo: VideoRepository,
    queue: ConversionHandle,
    config: Arc<AppConfig>,
}

impl VideoService {
    pub fn new(repo: VideoRepository, queue: ConversionHandle, config: Arc<AppConfig>) -> Self {
        Self {
            repo,
            queue,
            config,
        }
    }

    /// Accept an upload: place the raw bytes at
    /// `<RAW_DIR>/<date>/<slug>/source.<ext>`, probe the duration, persist
    /// the record, and enqueue the slug for conversion.
    pub async fn save_upload(&self, filename: &str, data: &[u8]) -> ApiResult<Video> {
        validate_filename(filename)?;

        let slug = random_slug(self.config.slug_length);
        let mut video = Video::new_upload(&slug, filename, data.len() as u64, None);

        let raw_dir = self.raw_slug_dir(&video);
        tokio::fs::create_dir_all(&raw_dir).await?;
        let source = raw_dir.join(video.source_name());
        tokio::fs::write(&source, data).await?;

        // Probing is best-effort metadata; an unreadable duration must not
        // reject the upload.
        video.duration_seconds = match probe_duration(&source).await {
            Ok(seconds) => Some(seconds),
            Err(e) => {
                warn!(slug = %slug, error = %e, "duration probe failed");
                None
            }
        };

        self.repo.insert(&video).await?;
        self.queue.enqueue(&slug).await?;

        info!(slug = %slug, filename, size_bytes = video.size_bytes, "upload accepted");
        Ok(video)
    }

    pub async fn get(&self, id: &VideoId) -> ApiResult<Video> {
        Ok(self.repo.get_by_id(id).await?)
    }

    pub async fn list(
        &self,
        mut pagination: Pagination,
        filter: ListFilter,
    ) -> ApiResult<ListPayload<Video>> {
        pagination.normalize();
        Ok(self.repo.list(pagination, filter).await?)
    }

    /// Update the display filename. Archived videos are immutable.
    pub async fn rename(&self, id: &VideoId, filename: &str) -> ApiResult<Video> {
        validate_filename(filename)?;

        let video = self.repo.get_by_id(id).await?;
        if video.is_archived() {
            return Err(ApiError::AlreadyArchived);
        }

        Ok(self.repo.rename(id, filename).await?)
    }

    /// Archive a video: relocate its raw source into the archive directory
    /// (named `<slug>.<ext>`), remove the raw slug directory, and mark the
    /// record archived.
    ///
    /// Archiving is rejected while a conversion is in flight and is not
    /// repeatable; archived is terminal.
    pub async fn archive(&self, id: &VideoId) -> ApiResult<()> {
        let video = self.repo.get_by_id(id).await?;
        if video.is_archived() {
            return Err(ApiError::AlreadyArchived);
        }
        if video.is_processing() {
            return Err(ApiError::Processing);
        }

        let raw_dir = self.raw_slug_dir(&video);
        let source = raw_dir.join(video.source_name());
        let dest = self
            .config
            .archive_dir
            .join(format!("{}.{}", video.slug, video.source_ext()));

        match move_file(&source, &dest).await {
            Ok(()) => {}
            Err(MediaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                // Raw source already gone; archive the record anyway.
                warn!(slug = %video.slug, "raw source missing, archiving record only");
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = tokio::fs::remove_dir_all(&raw_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(slug = %video.slug, error = %e, "failed to remove raw directory");
            }
        }

        self.repo.archive(id, Utc::now()).await?;
        info!(slug = %video.slug, "video archived");
        Ok(())
    }

    /// Attach public playback URLs to a record.
    pub fn to_dto(&self, video: Video) -> VideoDto {
        let base = (video.status == VideoStatus::Complete).then(|| {
            format!(
                "{}/{}/{}",
                self.config.public_media_url,
                video.date_path(),
                video.slug
            )
        });

        VideoDto {
            converted_url: base.as_ref().map(|b| format!("{b}/index.m3u8")),
            preview_url: base.as_ref().map(|b| format!("{b}/preview.png")),
            video,
        }
    }

    fn raw_slug_dir(&self, video: &Video) -> PathBuf {
        self.config
            .pipeline
            .raw_dir
            .join(video.date_path())
            .join(&video.slug)
    }
}

fn validate_filename(filename: &str) -> ApiResult<()> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("filename must not be empty"));
    }
    if trimmed.chars().count() > MAX_FILENAME_LEN {
        return Err(ApiError::validation(format!(
            "filename must be at most {MAX_FILENAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tempfile::TempDir;

    use vod_media::{HlsSettings, FfmpegPackager};
    use vod_pipeline::{ConversionPipeline, PipelineConfig};
    use vod_store::{CacheConfig, MemoryStore, VideoCache, VideoStore};

    struct TestEnv {
        _root: TempDir,
        store: Arc<MemoryStore>,
        service: VideoService,
        // Holds the queue receiver open; the dispatcher never runs in these
        // tests, enqueued slugs just sit in the buffer.
        _pipeline: ConversionPipeline,
        config: Arc<AppConfig>,
    }

    fn test_env() -> TestEnv {
        let root = TempDir::new().unwrap();

        let config = Arc::new(AppConfig {
            archive_dir: root.path().join("archive"),
            slug_length: 12,
            pipeline: PipelineConfig {
                raw_dir: root.path().join("raw"),
                converted_dir: root.path().join("converted"),
                work_dir: root.path().join("work"),
                ..PipelineConfig::default()
            },
            ..AppConfig::default()
        });

        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(VideoCache::new(CacheConfig {
            default_ttl: Duration::from_secs(60),
            sweep_interval: Duration::ZERO,
        }));
        let repo = VideoRepository::new(store.clone(), cache);

        let packager = Arc::new(FfmpegPackager::new(HlsSettings::default()));
        let (pipeline, handle) =
            ConversionPipeline::new(config.pipeline.clone(), repo.clone(), packager);

        TestEnv {
            _root: root,
            store,
            service: VideoService::new(repo, handle, config.clone()),
            _pipeline: pipeline,
            config,
        }
    }

    async fn seed(env: &TestEnv, status: VideoStatus) -> Video {
        let mut video = Video::new_upload("abc123", "holiday.mp4", 9, Some(42));
        video.status = status;
        if status == VideoStatus::Archived {
            video.archived_at = Some(Utc::now());
        }
        env.store.insert(&video).await.unwrap();

        let raw = env
            .config
            .pipeline
            .raw_dir
            .join(video.date_path())
            .join(&video.slug);
        tokio::fs::create_dir_all(&raw).await.unwrap();
        tokio::fs::write(raw.join(video.source_name()), b"raw bytes")
            .await
            .unwrap();

        video
    }

    #[tokio::test]
    async fn upload_places_raw_file_and_persists_record() {
        let env = test_env();

        let video = env
            .service
            .save_upload("holiday.MOV", b"not really a video")
            .await
            .unwrap();

        assert_eq!(video.slug.len(), 12);
        assert_eq!(video.status, VideoStatus::Uploaded);
        assert_eq!(video.size_bytes, 18);
        assert_eq!(video.filename, "holiday.MOV");

        let source = env
            .config
            .pipeline
            .raw_dir
            .join(video.date_path())
            .join(&video.slug)
            .join("source.mov");
        assert!(source.exists());

        let stored = env.store.find_by_slug(&video.slug).await.unwrap();
        assert_eq!(stored.map(|v| v.id), Some(video.id));
    }

    #[tokio::test]
    async fn upload_rejects_bad_filenames() {
        let env = test_env();

        let err = env.service.save_upload("  ", b"data").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let long = "x".repeat(201);
        let err = env.service.save_upload(&long, b"data").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn archive_relocates_raw_source_and_marks_record() {
        let env = test_env();
        let video = seed(&env, VideoStatus::Complete).await;

        env.service.archive(&video.id).await.unwrap();

        let archived_file = env.config.archive_dir.join("abc123.mp4");
        assert!(archived_file.exists());
        let raw_dir = env
            .config
            .pipeline
            .raw_dir
            .join(video.date_path())
            .join("abc123");
        assert!(!raw_dir.exists());

        let fetched = env.service.get(&video.id).await.unwrap();
        assert_eq!(fetched.status, VideoStatus::Archived);
        assert!(fetched.archived_at.is_some());
    }

    #[tokio::test]
    async fn archive_rejects_processing_videos() {
        let env = test_env();
        let video = seed(&env, VideoStatus::Processing).await;

        let err = env.service.archive(&video.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Processing));

        let fetched = env.service.get(&video.id).await.unwrap();
        assert_eq!(fetched.status, VideoStatus::Processing);
    }

    #[tokio::test]
    async fn archive_is_not_repeatable() {
        let env = test_env();
        let video = seed(&env, VideoStatus::Archived).await;

        let err = env.service.archive(&video.id).await.unwrap_err();
        assert!(matches!(err, ApiError::AlreadyArchived));
    }

    #[tokio::test]
    async fn rename_rejects_archived_videos() {
        let env = test_env();
        let video = seed(&env, VideoStatus::Archived).await;

        let err = env
            .service
            .rename(&video.id, "renamed.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::AlreadyArchived));
    }

    #[tokio::test]
    async fn rename_updates_active_videos() {
        let env = test_env();
        let video = seed(&env, VideoStatus::Complete).await;

        let renamed = env
            .service
            .rename(&video.id, "renamed.mp4")
            .await
            .unwrap();
        assert_eq!(renamed.filename, "renamed.mp4");
    }

    #[tokio::test]
    async fn dto_urls_appear_only_once_complete() {
        let env = test_env();

        let mut video = Video::new_upload("abc123", "a.mp4", 1, None);
        let dto = env.service.to_dto(video.clone());
        assert!(dto.converted_url.is_none());

        video.status = VideoStatus::Complete;
        let date = video.date_path();
        let dto = env.service.to_dto(video);
        assert_eq!(
            dto.converted_url.as_deref(),
            Some(format!("/media/{date}/abc123/index.m3u8").as_str())
        );
        assert_eq!(
            dto.preview_url.as_deref(),
            Some(format!("/media/{date}/abc123/preview.png").as_str())
        );
    }
}
