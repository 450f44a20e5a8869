//! Video metadata models.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a video record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Video lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Raw file stored, conversion not started yet
    #[default]
    Uploaded,
    /// Conversion pipeline is working on it
    Processing,
    /// HLS artifacts are in place
    Complete,
    /// Conversion failed; may be re-enqueued externally
    Interrupted,
    /// Terminal state, no further transitions
    Archived,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploaded => "uploaded",
            VideoStatus::Processing => "processing",
            VideoStatus::Complete => "complete",
            VideoStatus::Interrupted => "interrupted",
            VideoStatus::Archived => "archived",
        }
    }

    /// Check if this is a terminal state (no more transitions modeled).
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Archived)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A video record as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    /// Unique record ID
    pub id: VideoId,

    /// Short random public identifier, doubles as a filesystem path segment
    pub slug: String,

    /// Original upload filename
    pub filename: String,

    /// Upload size in bytes
    pub size_bytes: u64,

    /// Duration probed at upload time, if probing succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i32>,

    /// Creation timestamp; also derives the date-partitioned storage path
    pub created_at: DateTime<Utc>,

    /// Lifecycle status
    #[serde(default)]
    pub status: VideoStatus,

    /// Count of failed processing attempts, never decreases
    #[serde(default)]
    pub retry_attempt: u32,

    /// Last failure description; absent means the video never failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Set once, on the transition into `processing`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_started_at: Option<DateTime<Utc>>,

    /// Set once, when HLS artifacts landed in their final location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hls_ready_at: Option<DateTime<Utc>>,

    /// Set if and only if status is `archived`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Video {
    /// Create a freshly uploaded video record.
    pub fn new_upload(
        slug: impl Into<String>,
        filename: impl Into<String>,
        size_bytes: u64,
        duration_seconds: Option<i32>,
    ) -> Self {
        Self {
            id: VideoId::new(),
            slug: slug.into(),
            filename: filename.into(),
            size_bytes,
            duration_seconds,
            created_at: Utc::now(),
            status: VideoStatus::Uploaded,
            retry_attempt: 0,
            failure_reason: None,
            processing_started_at: None,
            hls_ready_at: None,
            archived_at: None,
        }
    }

    /// `YYYY/MM/DD` path segment derived from the creation timestamp.
    ///
    /// Raw input, converted output, and public playback URLs all share this
    /// partitioning.
    pub fn date_path(&self) -> String {
        self.created_at.format("%Y/%m/%d").to_string()
    }

    /// Lowercased extension of the original filename, `mp4` when missing.
    ///
    /// The raw file on disk is stored as `source.<ext>`.
    pub fn source_ext(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| "mp4".to_string())
    }

    /// Name of the raw file inside the slug directory.
    pub fn source_name(&self) -> String {
        format!("source.{}", self.source_ext())
    }

    pub fn is_processing(&self) -> bool {
        self.status == VideoStatus::Processing
    }

    pub fn is_archived(&self) -> bool {
        self.status == VideoStatus::Archived || self.archived_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn video_id_is_unique() {
        assert_ne!(VideoId::new(), VideoId::new());
    }

    #[test]
    fn new_upload_defaults() {
        let video = Video::new_upload("abc123", "holiday.mp4", 1024, Some(42));
        assert_eq!(video.status, VideoStatus::Uploaded);
        assert_eq!(video.retry_attempt, 0);
        assert!(video.failure_reason.is_none());
        assert!(video.archived_at.is_none());
        assert_eq!(video.duration_seconds, Some(42));
    }

    #[test]
    fn date_path_is_zero_padded() {
        let mut video = Video::new_upload("abc123", "a.mp4", 0, None);
        video.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(video.date_path(), "2024/03/01");
    }

    #[test]
    fn source_ext_falls_back_to_mp4() {
        let video = Video::new_upload("abc123", "clip.MOV", 0, None);
        assert_eq!(video.source_ext(), "mov");
        assert_eq!(video.source_name(), "source.mov");

        let video = Video::new_upload("abc123", "noext", 0, None);
        assert_eq!(video.source_name(), "source.mp4");
    }

    #[test]
    fn archived_is_the_only_terminal_status() {
        assert!(VideoStatus::Archived.is_terminal());
        for status in [
            VideoStatus::Uploaded,
            VideoStatus::Processing,
            VideoStatus::Complete,
            VideoStatus::Interrupted,
        ] {
            assert!(!status.is_terminal());
        }
    }
}
