//! End-to-end pipeline scenarios with a stubbed packager.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use vod_media::{HlsPackager, MediaError, MediaResult};
use vod_models::{Video, VideoStatus};
use vod_pipeline::{ConversionHandle, ConversionPipeline, PipelineConfig};
use vod_store::{CacheConfig, MemoryStore, VideoCache, VideoRepository, VideoStore};

/// Packager that writes a plausible HLS bundle.
struct OkPackager;

#[async_trait]
impl HlsPackager for OkPackager {
    async fn package(&self, _input: &Path, out_dir: &Path) -> MediaResult<()> {
        tokio::fs::create_dir_all(out_dir).await?;
        tokio::fs::write(out_dir.join("index.m3u8"), b"#EXTM3U\n#EXT-X-ENDLIST\n").await?;
        tokio::fs::write(out_dir.join("seg_000000.ts"), b"segment").await?;
        tokio::fs::write(out_dir.join("preview.png"), b"png").await?;
        Ok(())
    }
}

/// Packager that always fails without producing output.
struct FailingPackager;

#[async_trait]
impl HlsPackager for FailingPackager {
    async fn package(&self, _input: &Path, _out_dir: &Path) -> MediaResult<()> {
        Err(MediaError::ffmpeg_failed(
            "ffmpeg exited with non-zero status",
            Some(1),
        ))
    }
}

/// Packager that blocks until released, tracking concurrent executions.
struct BlockingPackager {
    current: AtomicUsize,
    max_seen: AtomicUsize,
    release: watch::Receiver<bool>,
}

impl BlockingPackager {
    fn new(release: watch::Receiver<bool>) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
            release,
        }
    }
}

#[async_trait]
impl HlsPackager for BlockingPackager {
    async fn package(&self, _input: &Path, _out_dir: &Path) -> MediaResult<()> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);

        let mut release = self.release.clone();
        while !*release.borrow() {
            if release.changed().await.is_err() {
                break;
            }
        }

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

struct TestEnv {
    root: TempDir,
    store: Arc<MemoryStore>,
    repo: VideoRepository,
    handle: ConversionHandle,
    shutdown: watch::Sender<bool>,
    dispatcher: JoinHandle<()>,
}

impl TestEnv {
    fn raw_dir(&self) -> PathBuf {
        self.root.path().join("raw")
    }

    fn converted_dir(&self) -> PathBuf {
        self.root.path().join("converted")
    }

    fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    async fn seed_video(&self, slug: &str) -> Video {
        let mut video = Video::new_upload(slug, format!("{slug}.mp4"), 7, Some(42));
        video.created_at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        self.store.insert(&video).await.unwrap();

        let raw = self.raw_dir().join("2024/03/01").join(slug);
        tokio::fs::create_dir_all(&raw).await.unwrap();
        tokio::fs::write(raw.join("source.mp4"), b"raw bytes").await.unwrap();

        video
    }

    /// Poll by slug (bypasses the cache) until the video leaves the
    /// non-terminal conversion states.
    async fn wait_for_outcome(&self, slug: &str) -> Video {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            let video = self.repo.get_by_slug(slug).await.unwrap();
            if matches!(video.status, VideoStatus::Complete | VideoStatus::Interrupted) {
                return video;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "video {slug} stuck in {:?}",
                video.status
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn stop(self) {
        let _ = self.shutdown.send(true);
        tokio::time::timeout(Duration::from_secs(1), self.dispatcher)
            .await
            .expect("dispatcher must observe shutdown")
            .unwrap();
    }
}

fn start_pipeline(parallel: usize, packager: Arc<dyn HlsPackager>) -> TestEnv {
    start_pipeline_with_capacity(parallel, 16, packager)
}

fn start_pipeline_with_capacity(
    parallel: usize,
    queue_capacity: usize,
    packager: Arc<dyn HlsPackager>,
) -> TestEnv {
    let root = TempDir::new().unwrap();

    let config = PipelineConfig {
        parallel,
        queue_capacity,
        raw_dir: root.path().join("raw"),
        converted_dir: root.path().join("converted"),
        work_dir: root.path().join("work"),
    };

    let store = Arc::new(MemoryStore::new());
    let cache = Arc::new(VideoCache::new(CacheConfig {
        default_ttl: Duration::from_secs(60),
        sweep_interval: Duration::ZERO,
    }));
    let repo = VideoRepository::new(store.clone(), cache);

    let (pipeline, handle) = ConversionPipeline::new(config, repo.clone(), packager);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let dispatcher = tokio::spawn(pipeline.run(shutdown_rx));

    TestEnv {
        root,
        store,
        repo,
        handle,
        shutdown,
        dispatcher,
    }
}

#[tokio::test]
async fn successful_job_completes_and_places_artifacts() {
    let env = start_pipeline(2, Arc::new(OkPackager));
    env.seed_video("abc123").await;

    env.handle.enqueue("abc123").await.unwrap();
    let video = env.wait_for_outcome("abc123").await;

    assert_eq!(video.status, VideoStatus::Complete);
    assert!(video.hls_ready_at.is_some());
    assert!(video.processing_started_at.is_some());
    assert_eq!(video.retry_attempt, 0);

    let final_dir = env.converted_dir().join("2024/03/01/abc123");
    assert!(final_dir.join("index.m3u8").exists());
    assert!(final_dir.join("seg_000000.ts").exists());
    assert!(final_dir.join("preview.png").exists());
    assert!(
        !env.work_dir().join("abc123").exists(),
        "scratch directory must be removed"
    );

    env.stop().await;
}

#[tokio::test]
async fn failed_packaging_interrupts_and_cleans_scratch() {
    let env = start_pipeline(2, Arc::new(FailingPackager));
    env.seed_video("xyz789").await;

    env.handle.enqueue("xyz789").await.unwrap();
    let video = env.wait_for_outcome("xyz789").await;

    assert_eq!(video.status, VideoStatus::Interrupted);
    assert_eq!(video.retry_attempt, 1);
    assert!(video
        .failure_reason
        .as_deref()
        .unwrap_or_default()
        .contains("ffmpeg"));
    assert!(video.hls_ready_at.is_none());

    assert!(!env.converted_dir().join("2024/03/01/xyz789").exists());
    assert!(!env.work_dir().join("xyz789").exists());

    env.stop().await;
}

#[tokio::test]
async fn concurrency_never_exceeds_the_permit_ceiling() {
    let (release, release_rx) = watch::channel(false);
    let packager = Arc::new(BlockingPackager::new(release_rx));
    let env = start_pipeline(2, packager.clone());

    let slugs = ["job001", "job002", "job003", "job004", "job005"];
    for slug in slugs {
        env.seed_video(slug).await;
        env.handle.enqueue(slug).await.unwrap();
    }

    // Let the dispatcher admit as much as it is allowed to.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(packager.current.load(Ordering::SeqCst), 2);
    assert_eq!(packager.max_seen.load(Ordering::SeqCst), 2);

    release.send(true).unwrap();
    for slug in slugs {
        let video = env.wait_for_outcome(slug).await;
        assert_eq!(video.status, VideoStatus::Complete);
    }
    assert_eq!(packager.max_seen.load(Ordering::SeqCst), 2);

    env.stop().await;
}

#[tokio::test]
async fn unknown_slug_is_dropped_without_stalling_the_queue() {
    let env = start_pipeline(1, Arc::new(OkPackager));
    env.seed_video("real42").await;

    env.handle.enqueue("no-such-slug").await.unwrap();
    env.handle.enqueue("real42").await.unwrap();

    let video = env.wait_for_outcome("real42").await;
    assert_eq!(video.status, VideoStatus::Complete);

    env.stop().await;
}

#[tokio::test]
async fn shutdown_stops_the_dispatcher() {
    let env = start_pipeline(1, Arc::new(OkPackager));
    // No work enqueued; the dispatcher is idle on recv.
    env.stop().await;
}

#[tokio::test]
async fn shutdown_waits_for_in_flight_work() {
    let (release, release_rx) = watch::channel(false);
    let packager = Arc::new(BlockingPackager::new(release_rx));
    let mut env = start_pipeline(2, packager.clone());
    env.seed_video("abc123").await;

    env.handle.enqueue("abc123").await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while packager.current.load(Ordering::SeqCst) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "job never started");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    env.shutdown.send(true).unwrap();

    // The dispatcher must keep running while the workflow is blocked.
    let dispatcher = &mut env.dispatcher;
    assert!(
        tokio::time::timeout(Duration::from_millis(300), &mut *dispatcher)
            .await
            .is_err(),
        "dispatcher returned with a workflow still in flight"
    );
    let video = env.repo.get_by_slug("abc123").await.unwrap();
    assert_eq!(video.status, VideoStatus::Processing);

    release.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .expect("dispatcher must finish once the workflow completes")
        .unwrap();

    let video = env.wait_for_outcome("abc123").await;
    assert_eq!(video.status, VideoStatus::Complete);
    assert!(!env.work_dir().join("abc123").exists());
}

#[tokio::test]
async fn full_queue_suspends_enqueue_without_dropping_work() {
    let (release, release_rx) = watch::channel(false);
    let packager = Arc::new(BlockingPackager::new(release_rx));
    let env = start_pipeline_with_capacity(1, 1, packager.clone());

    // One job executing, one parked on the permit, one in the queue buffer;
    // the fourth enqueue finds the queue full and must suspend.
    let slugs = ["job001", "job002", "job003", "job004"];
    for slug in slugs {
        env.seed_video(slug).await;
    }
    for slug in &slugs[..3] {
        env.handle.enqueue(*slug).await.unwrap();
    }

    let mut blocked = Box::pin(env.handle.enqueue("job004"));
    assert!(
        tokio::time::timeout(Duration::from_millis(300), &mut blocked)
            .await
            .is_err(),
        "enqueue into a full queue must suspend"
    );

    release.send(true).unwrap();
    blocked.await.unwrap();

    // Nothing was dropped: every job, the suspended one included, completes.
    for slug in slugs {
        let video = env.wait_for_outcome(slug).await;
        assert_eq!(video.status, VideoStatus::Complete);
    }

    env.stop().await;
}
