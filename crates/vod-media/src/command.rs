//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// How many trailing stderr lines to keep for error reporting.
const STDERR_TAIL_LINES: usize = 8;

/// Builder for ffmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Arguments placed before `-i`
    input_args: Vec<String>,
    /// Arguments placed after `-i`
    output_args: Vec<String>,
    /// Whether to overwrite the output
    overwrite: bool,
    /// ffmpeg log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new ffmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input argument (before `-i`).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add an output argument (after `-i`).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Extract a single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Set ffmpeg log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the full argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for ffmpeg commands with cooperative cancellation.
#[derive(Default)]
pub struct FfmpegRunner {
    /// Shared shutdown signal; a `true` value kills the child promptly
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { cancel_rx: None }
    }

    /// Bind the runner to a shutdown signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Run an ffmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("running ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let tail_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            tail.into_iter().collect::<Vec<_>>().join("\n")
        });

        let status = self.wait_for_completion(&mut child).await;
        let stderr_tail = tail_handle.await.unwrap_or_default();

        let status = status?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                format!("ffmpeg exited with non-zero status: {}", stderr_tail),
                status.code(),
            ))
        }
    }

    /// Wait for the child, killing it if the shutdown signal fires first.
    async fn wait_for_completion(
        &self,
        child: &mut Child,
    ) -> MediaResult<std::process::ExitStatus> {
        let mut cancel_rx = match &self.cancel_rx {
            Some(rx) => rx.clone(),
            None => return Ok(child.wait().await?),
        };

        if *cancel_rx.borrow() {
            let _ = child.kill().await;
            return Err(MediaError::Cancelled);
        }

        tokio::select! {
            status = child.wait() => Ok(status?),
            res = cancel_rx.changed() => {
                if res.is_ok() && *cancel_rx.borrow() {
                    warn!("shutdown signalled, killing ffmpeg");
                    let _ = child.kill().await;
                    return Err(MediaError::Cancelled);
                }
                // Sender dropped without signalling; keep waiting.
                Ok(child.wait().await?)
            }
        }
    }
}
