//! Filesystem utilities for relocating artifact directories.
//!
//! Converted output is produced in a scratch directory and then moved to its
//! final location, which may live on a different volume. Rename is attempted
//! first; EXDEV falls back to a full recursive copy followed by source
//! removal. The source is only deleted after the copy fully succeeded, so a
//! failure mid-copy never loses data.

use std::path::Path;

use tokio::fs;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Move a directory from `src` to `dst`, handling cross-device moves.
pub async fn move_dir(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "cross-device rename, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_dir(src, dst).await?;
            fs::remove_dir_all(src).await?;
            Ok(())
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Move a single file from `src` to `dst`, handling cross-device moves.
///
/// Creates the destination's parent directory if needed.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "cross-device rename, falling back to copy+delete: {} -> {}",
                src.display(),
                dst.display()
            );
            fs::copy(src, dst).await?;
            fs::remove_file(src).await?;
            Ok(())
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV is error code 18 on Linux/macOS
    e.raw_os_error() == Some(18)
}

/// Recursively copy a directory tree. Does not touch the source.
pub async fn copy_dir(src: &Path, dst: &Path) -> MediaResult<()> {
    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        fs::create_dir_all(&to).await?;

        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), &target).await?;
            }
        }
    }

    Ok(())
}
