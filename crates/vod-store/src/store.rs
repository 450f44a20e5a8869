//! Storage backend trait and the in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use vod_models::{ListFilter, ListPayload, Pagination, Video, VideoId, VideoStatus};

use crate::error::StoreResult;

/// A partial update applied to a stored video.
///
/// Mirrors the conditional-update contract the repository needs: the backend
/// applies whatever fields are set and reports whether a matching row
/// existed.
#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub filename: Option<String>,
    pub status: Option<VideoStatus>,
    pub failure_reason: Option<String>,
    pub processing_started_at: Option<DateTime<Utc>>,
    pub hls_ready_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    /// Bump `retry_attempt` by one as part of this update
    pub increment_retry: bool,
}

impl VideoChanges {
    pub fn rename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    pub fn processing(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(VideoStatus::Processing),
            processing_started_at: Some(at),
            ..Default::default()
        }
    }

    pub fn ready(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(VideoStatus::Complete),
            hls_ready_at: Some(at),
            ..Default::default()
        }
    }

    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self {
            status: Some(VideoStatus::Interrupted),
            failure_reason: Some(reason.into()),
            increment_retry: true,
            ..Default::default()
        }
    }

    pub fn archived(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(VideoStatus::Archived),
            archived_at: Some(at),
            ..Default::default()
        }
    }

    /// Apply this change set to a record in place.
    pub fn apply(&self, video: &mut Video) {
        if let Some(filename) = &self.filename {
            video.filename = filename.clone();
        }
        if let Some(status) = self.status {
            video.status = status;
        }
        if let Some(reason) = &self.failure_reason {
            video.failure_reason = Some(reason.clone());
        }
        if let Some(at) = self.processing_started_at {
            video.processing_started_at = Some(at);
        }
        if let Some(at) = self.hls_ready_at {
            video.hls_ready_at = Some(at);
        }
        if let Some(at) = self.archived_at {
            video.archived_at = Some(at);
        }
        if self.increment_retry {
            video.retry_attempt += 1;
        }
    }
}

/// Storage backend for video records.
///
/// The repository owns all caching concerns; implementations only persist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Persist a new record.
    async fn insert(&self, video: &Video) -> StoreResult<()>;

    /// Point lookup by id. Absence is `Ok(None)`, not an error.
    async fn find_by_id(&self, id: &VideoId) -> StoreResult<Option<Video>>;

    /// Point lookup by slug.
    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Video>>;

    /// Filtered, reverse-chronological page plus the unpaginated total.
    async fn list(
        &self,
        pagination: Pagination,
        filter: ListFilter,
    ) -> StoreResult<ListPayload<Video>>;

    /// Conditional update; returns `true` iff a matching record existed.
    async fn update(&self, id: &VideoId, changes: VideoChanges) -> StoreResult<bool>;
}

/// In-process storage backend.
#[derive(Default)]
pub struct MemoryStore {
    videos: RwLock<HashMap<VideoId, Video>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn insert(&self, video: &Video) -> StoreResult<()> {
        let mut videos = self.videos.write().await;
        videos.insert(video.id.clone(), video.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &VideoId) -> StoreResult<Option<Video>> {
        let videos = self.videos.read().await;
        Ok(videos.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Video>> {
        let videos = self.videos.read().await;
        Ok(videos.values().find(|v| v.slug == slug).cloned())
    }

    async fn list(
        &self,
        pagination: Pagination,
        filter: ListFilter,
    ) -> StoreResult<ListPayload<Video>> {
        let videos = self.videos.read().await;

        let mut matching: Vec<Video> = videos
            .values()
            .filter(|v| match filter {
                ListFilter::All => true,
                ListFilter::Active => v.archived_at.is_none(),
                ListFilter::Archived => v.archived_at.is_some(),
            })
            .cloned()
            .collect();

        let total_count = matching.len() as u64;
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let data = matching
            .into_iter()
            .skip(pagination.offset as usize)
            .take(pagination.limit as usize)
            .collect();

        Ok(ListPayload { data, total_count })
    }

    async fn update(&self, id: &VideoId, changes: VideoChanges) -> StoreResult<bool> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(id) {
            Some(video) => {
                changes.apply(video);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
