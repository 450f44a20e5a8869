//! In-memory TTL cache for video records.
//!
//! Read-through companion to the repository: populated on cache misses,
//! invalidated on every confirmed write. Entries expire lazily on read and
//! eagerly through a periodic background sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use vod_models::{Video, VideoId};

/// Cache tuning knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without an explicit TTL
    pub default_ttl: Duration,
    /// Period of the background expiry sweep; zero disables the sweep
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            default_ttl: Duration::from_secs(
                std::env::var("DEFAULT_CACHE_EXPIRATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            sweep_interval: Duration::from_secs(
                std::env::var("DEFAULT_CACHE_CLEAN_FREQUENCY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}

/// A point-in-time snapshot of a video plus its expiration.
struct CacheEntry {
    video: Video,
    /// `None` means the entry never expires
    expires_at: Option<Instant>,
    /// The TTL that produced `expires_at`
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// TTL cache mapping video id to its last known record.
///
/// All entries live behind a single reader/writer lock: `get` takes the
/// shared side, every mutation the exclusive side. None of the operations can
/// fail; absence and expiry are normal outcomes.
pub struct VideoCache {
    entries: RwLock<HashMap<VideoId, CacheEntry>>,
    default_ttl: Duration,
    sweep_interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl VideoCache {
    pub fn new(config: CacheConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl: config.default_ttl,
            sweep_interval: config.sweep_interval,
            shutdown,
        }
    }

    /// Return the cached snapshot if present and not expired.
    pub async fn get(&self, id: &VideoId) -> Option<Video> {
        let entries = self.entries.read().await;
        let entry = entries.get(id)?;
        if entry.is_expired(Instant::now()) {
            return None;
        }
        Some(entry.video.clone())
    }

    /// Store a snapshot.
    ///
    /// `ttl` of `None` applies the configured default; `Some(Duration::ZERO)`
    /// stores an entry that never expires. An expiration instant is computed
    /// only for a strictly positive TTL.
    pub async fn set(&self, id: VideoId, video: Video, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let expires_at = if ttl > Duration::ZERO {
            Some(Instant::now() + ttl)
        } else {
            None
        };

        let mut entries = self.entries.write().await;
        entries.insert(
            id,
            CacheEntry {
                video,
                expires_at,
                ttl,
            },
        );
    }

    /// Unconditional removal; no-op on a missing key.
    pub async fn delete(&self, id: &VideoId) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.remove(id) {
            debug!(%id, ttl_secs = entry.ttl.as_secs(), "evicted from cache");
        }
    }

    /// Remove every expired entry. The only full scan over the store; holds
    /// the exclusive lock for the whole pass.
    pub async fn clean_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "cache sweep removed expired entries");
        }
        removed
    }

    /// Spawn the periodic expiry sweep, or return `None` when the configured
    /// sweep interval is zero.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.sweep_interval.is_zero() {
            info!("cache sweep disabled");
            return None;
        }

        let cache = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cache.sweep_interval);
            // The first tick completes immediately; skip it so the sweep
            // cadence starts one full interval after startup.
            ticker.tick().await;
            loop {
                tokio::select! {
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow() {
                            info!("cache sweeper stopped");
                            return;
                        }
                    }
                    _ = ticker.tick() => {
                        cache.clean_expired().await;
                    }
                }
            }
        }))
    }

    /// Stop the sweeper. Safe to call any number of times.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}
