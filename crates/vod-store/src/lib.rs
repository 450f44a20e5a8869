//! Video persistence for the vodhost backend.
//!
//! Three layers, innermost first:
//! - [`VideoStore`]: the storage backend seam. [`MemoryStore`] is the shipped
//!   implementation; a SQL backend would implement the same trait.
//! - [`VideoCache`]: an in-memory TTL cache for point lookups by id.
//! - [`VideoRepository`]: the single place mutations happen. Reads go through
//!   the cache, writes invalidate it (write-then-invalidate, never
//!   update-in-place).

pub mod cache;
pub mod error;
pub mod repository;
pub mod store;

pub use cache::{CacheConfig, VideoCache};
pub use error::{StoreError, StoreResult};
pub use repository::VideoRepository;
pub use store::{MemoryStore, VideoChanges, VideoStore};
