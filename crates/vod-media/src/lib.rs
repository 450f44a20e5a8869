//! FFmpeg CLI wrapper for the vodhost backend.
//!
//! Everything that touches external tools or the filesystem layout of media
//! artifacts lives here: the ffmpeg command runner, the HLS packager, the
//! ffprobe duration probe, and the cross-device directory move used when
//! relocating converted output.

pub mod command;
pub mod error;
pub mod fs;
pub mod packager;
pub mod probe;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs::{move_dir, move_file};
pub use packager::{FfmpegPackager, HlsPackager, HlsSettings};
pub use probe::probe_duration;
