//! FFprobe duration probe.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Probe a media file for its duration in whole seconds (rounded).
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<i32> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    let duration = parsed
        .format
        .duration
        .ok_or_else(|| MediaError::FfprobeFailed("empty duration".to_string()))?;
    let seconds: f64 = duration
        .parse()
        .map_err(|_| MediaError::FfprobeFailed(format!("unparseable duration: {duration}")))?;

    Ok(seconds.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_reported_before_spawning() {
        let err = probe_duration("/definitely/not/here.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn ffprobe_json_parses() {
        let raw = r#"{"format": {"duration": "41.504000"}}"#;
        let parsed: FfprobeOutput = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.format.duration.as_deref(), Some("41.504000"));
    }
}
