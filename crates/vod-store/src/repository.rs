//! The video repository: sole writer of persisted video state.
//!
//! Every mutation performs the storage write first and, only after a
//! confirmed write, deletes the cache entry. The cache is never updated in
//! place, so a reader can observe pre- or post-update state during the race
//! window but never a value cached after a failed write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use vod_models::{ListFilter, ListPayload, Pagination, Video, VideoId};

use crate::cache::VideoCache;
use crate::error::{StoreError, StoreResult};
use crate::store::{VideoChanges, VideoStore};

/// Cache-fronted access to video records.
#[derive(Clone)]
pub struct VideoRepository {
    store: Arc<dyn VideoStore>,
    cache: Arc<VideoCache>,
}

impl VideoRepository {
    pub fn new(store: Arc<dyn VideoStore>, cache: Arc<VideoCache>) -> Self {
        Self { store, cache }
    }

    /// Create a new record. Nothing is cached yet, so the cache is not
    /// touched.
    pub async fn insert(&self, video: &Video) -> StoreResult<VideoId> {
        self.store.insert(video).await?;
        Ok(video.id.clone())
    }

    /// Read-through point lookup by id.
    pub async fn get_by_id(&self, id: &VideoId) -> StoreResult<Video> {
        if let Some(video) = self.cache.get(id).await {
            debug!(slug = %video.slug, "cache hit");
            return Ok(video);
        }

        match self.store.find_by_id(id).await {
            Ok(Some(video)) => {
                self.cache.set(id.clone(), video.clone(), None).await;
                debug!(slug = %video.slug, "cache populated");
                Ok(video)
            }
            Ok(None) => Err(StoreError::NotFound),
            Err(e) => {
                // Defensive no-op in the usual case: nothing was cached, but
                // if a stale entry slipped in it must not outlive a backend
                // failure.
                self.cache.delete(id).await;
                Err(e)
            }
        }
    }

    /// Lookup by slug. The pipeline resolves work by slug, which is not the
    /// cache key, so this always hits storage.
    pub async fn get_by_slug(&self, slug: &str) -> StoreResult<Video> {
        match self.store.find_by_slug(slug).await? {
            Some(video) => Ok(video),
            None => Err(StoreError::NotFound),
        }
    }

    /// Filtered, paginated, reverse-chronological listing. Never cached.
    pub async fn list(
        &self,
        pagination: Pagination,
        filter: ListFilter,
    ) -> StoreResult<ListPayload<Video>> {
        self.store.list(pagination, filter).await
    }

    /// Update the display filename and return the fresh record.
    pub async fn rename(&self, id: &VideoId, filename: impl Into<String>) -> StoreResult<Video> {
        self.mutate(id, VideoChanges::rename(filename)).await?;
        self.get_by_id(id).await
    }

    /// uploaded → processing; records the processing start instant.
    pub async fn set_processing(&self, id: &VideoId, at: DateTime<Utc>) -> StoreResult<()> {
        self.mutate(id, VideoChanges::processing(at)).await
    }

    /// processing → complete; records when HLS artifacts became ready.
    pub async fn set_ready(&self, id: &VideoId, at: DateTime<Utc>) -> StoreResult<()> {
        self.mutate(id, VideoChanges::ready(at)).await
    }

    /// processing → interrupted; records the failure reason and bumps the
    /// retry counter.
    pub async fn set_interrupted(&self, id: &VideoId, reason: impl Into<String>) -> StoreResult<()> {
        self.mutate(id, VideoChanges::interrupted(reason)).await
    }

    /// any → archived. State validation is the caller's responsibility; the
    /// repository only guarantees write-then-invalidate.
    pub async fn archive(&self, id: &VideoId, at: DateTime<Utc>) -> StoreResult<()> {
        self.mutate(id, VideoChanges::archived(at)).await
    }

    /// Write first; invalidate only after the backend confirmed a matching
    /// row. Zero rows means not-found and the cache is left untouched.
    async fn mutate(&self, id: &VideoId, changes: VideoChanges) -> StoreResult<()> {
        let affected = self.store.update(id, changes).await?;
        if !affected {
            return Err(StoreError::NotFound);
        }
        self.cache.delete(id).await;
        Ok(())
    }
}
