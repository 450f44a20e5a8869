//! The dispatcher: bounded queue in, permit-gated workflow tasks out.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, info};

use vod_media::HlsPackager;
use vod_store::VideoRepository;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::workflow;

/// Everything a per-video workflow needs, shared across jobs.
pub(crate) struct JobContext {
    pub(crate) repo: VideoRepository,
    pub(crate) packager: Arc<dyn HlsPackager>,
    pub(crate) config: PipelineConfig,
}

/// Cloneable producer side of the conversion queue.
#[derive(Clone)]
pub struct ConversionHandle {
    tx: mpsc::Sender<String>,
}

impl ConversionHandle {
    /// Append a slug to the conversion queue.
    ///
    /// Suspends when the queue is at capacity (backpressure); work is never
    /// silently dropped. Fails only once the pipeline has shut down.
    pub async fn enqueue(&self, slug: impl Into<String>) -> PipelineResult<()> {
        let slug = slug.into();
        debug!(slug, "enqueueing conversion");
        self.tx
            .send(slug)
            .await
            .map_err(|_| PipelineError::QueueClosed)
    }
}

/// Bounded-concurrency conversion dispatcher.
pub struct ConversionPipeline {
    rx: mpsc::Receiver<String>,
    ctx: Arc<JobContext>,
    parallel: usize,
}

impl ConversionPipeline {
    pub fn new(
        config: PipelineConfig,
        repo: VideoRepository,
        packager: Arc<dyn HlsPackager>,
    ) -> (Self, ConversionHandle) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let parallel = config.parallel;
        let ctx = Arc::new(JobContext {
            repo,
            packager,
            config,
        });
        (Self { rx, ctx, parallel }, ConversionHandle { tx })
    }

    /// Run the dispatcher loop until the shutdown signal fires or every
    /// handle is dropped, then wait for in-flight workflows to finish.
    ///
    /// Admit-then-execute: a concurrency permit is acquired before each
    /// workflow task is spawned and travels into the task, so it is released
    /// on every exit path. The permit pool is the sole throttle; queue order
    /// is the only ordering guarantee. Shutdown is observed between dequeues;
    /// the final drain reacquires every permit, so `run` returns only once
    /// spawned workflows have completed. Callers wanting a bounded drain wrap
    /// the task in a timeout.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let permits = Arc::new(Semaphore::new(self.parallel));
        info!(parallel = self.parallel, "conversion pipeline started");

        loop {
            tokio::select! {
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                maybe_slug = self.rx.recv() => {
                    let Some(slug) = maybe_slug else {
                        break;
                    };

                    let permit = match Arc::clone(&permits).acquire_owned().await {
                        Ok(permit) => permit,
                        // The semaphore is never closed; this arm is
                        // unreachable but must not panic the dispatcher.
                        Err(_) => break,
                    };

                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let _permit = permit;
                        workflow::process(&ctx, &slug).await;
                    });
                }
            }
        }

        // Drain: every workflow task holds one permit, so holding all of
        // them again means nothing is still running.
        info!("conversion pipeline draining in-flight work");
        let _ = permits.acquire_many(self.parallel as u32).await;

        info!("conversion pipeline stopped");
    }
}
