//! HLS packaging: one input file in, a segmented streaming bundle out.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Encoding parameters for the HLS rendition.
#[derive(Debug, Clone)]
pub struct HlsSettings {
    /// Target segment duration in seconds
    pub segment_seconds: u32,
    /// Keyframe interval; keep at `fps * segment_seconds` for clean cuts
    pub gop: u32,
    /// Video bitrate, e.g. `5M`
    pub video_bitrate: String,
    /// Encoder buffer size, e.g. `10M`
    pub buffer_size: String,
    /// Audio bitrate, e.g. `128k`
    pub audio_bitrate: String,
    /// x264 preset
    pub preset: String,
    /// Preview image height in pixels
    pub preview_height: u32,
}

impl Default for HlsSettings {
    fn default() -> Self {
        Self {
            segment_seconds: 6,
            gop: 360,
            video_bitrate: "5M".to_string(),
            buffer_size: "10M".to_string(),
            audio_bitrate: "128k".to_string(),
            preset: "veryfast".to_string(),
            preview_height: 360,
        }
    }
}

/// Turns one input media file into a segmented streaming bundle plus a
/// preview image under `out_dir`. Possibly slow; cancellable through the
/// shutdown signal the implementation was constructed with.
#[async_trait]
pub trait HlsPackager: Send + Sync {
    async fn package(&self, input: &Path, out_dir: &Path) -> MediaResult<()>;
}

/// ffmpeg-backed packager producing `index.m3u8`, `seg_NNNNNN.ts` segments,
/// and `preview.png`.
pub struct FfmpegPackager {
    settings: HlsSettings,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegPackager {
    pub fn new(settings: HlsSettings) -> Self {
        Self {
            settings,
            cancel_rx: None,
        }
    }

    /// Bind packaging runs to a shutdown signal so in-flight ffmpeg
    /// processes die promptly at shutdown.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// The segmenting/transcoding invocation.
    pub fn hls_command(&self, input: &Path, out_dir: &Path) -> FfmpegCommand {
        let s = &self.settings;
        FfmpegCommand::new(input, out_dir.join("index.m3u8")).output_args([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            s.preset.clone(),
            "-b:v".to_string(),
            s.video_bitrate.clone(),
            "-maxrate".to_string(),
            s.video_bitrate.clone(),
            "-bufsize".to_string(),
            s.buffer_size.clone(),
            "-g".to_string(),
            s.gop.to_string(),
            "-keyint_min".to_string(),
            s.gop.to_string(),
            "-sc_threshold".to_string(),
            "0".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-ac".to_string(),
            "2".to_string(),
            "-b:a".to_string(),
            s.audio_bitrate.clone(),
            "-hls_time".to_string(),
            s.segment_seconds.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_flags".to_string(),
            "independent_segments".to_string(),
            "-hls_segment_filename".to_string(),
            out_dir.join("seg_%06d.ts").to_string_lossy().to_string(),
        ])
    }

    /// The preview-image invocation.
    pub fn preview_command(&self, input: &Path, out_dir: &Path) -> FfmpegCommand {
        FfmpegCommand::new(input, out_dir.join("preview.png"))
            .video_filter(format!(
                "thumbnail,scale=-2:{}",
                self.settings.preview_height
            ))
            .single_frame()
    }

    fn runner(&self) -> FfmpegRunner {
        match &self.cancel_rx {
            Some(rx) => FfmpegRunner::new().with_cancel(rx.clone()),
            None => FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl HlsPackager for FfmpegPackager {
    async fn package(&self, input: &Path, out_dir: &Path) -> MediaResult<()> {
        tokio::fs::create_dir_all(out_dir).await?;

        let runner = self.runner();
        runner.run(&self.hls_command(input, out_dir)).await?;
        runner.run(&self.preview_command(input, out_dir)).await?;

        info!(input = %input.display(), out_dir = %out_dir.display(), "packaged HLS bundle");
        Ok(())
    }
}
