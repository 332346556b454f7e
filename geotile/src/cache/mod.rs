//! Three-tier tile cache.
//!
//! - [`BoundedCostCache`]: strict-LRU map bounded by total entry cost
//! - [`TileCacheManager`]: disk, memory and texture tiers over one directory
//! - [`TileCacheService`]: the manager on its own worker thread, driven
//!   through async [`TileCacheHandle`]s

mod bounded;
mod config;
mod entry;
mod error;
mod manager;
mod migrate;
mod service;
mod stats;
mod types;

pub use bounded::{BoundedCacheStats, BoundedCostCache, RemovalCause, RemovalListener};
pub use config::{
    default_cache_root, default_tile_directory, TierConfig, TileCacheConfig, CACHE_DIR_NAME,
    DEFAULT_DISK_BYTES, DEFAULT_DISK_UNITS, DEFAULT_MEMORY_BYTES, DEFAULT_MEMORY_UNITS,
    DEFAULT_TEXTURE_EXTRA_BYTES, DEFAULT_TEXTURE_EXTRA_UNITS, LEGACY_PLUGIN_DIRS,
};
pub use entry::{
    is_tile_bogus, CacheOwner, DiskTileEntry, MemoryTileEntry, TextureTileEntry,
    BOGUS_TILE_PAYLOAD,
};
pub use error::TileCacheError;
pub use manager::{LoadStats, TileCacheManager};
pub use migrate::{purge_legacy_cache, PurgeResult};
pub use service::{TileCacheHandle, TileCacheService, WORKER_THREAD_NAME};
pub use stats::{TierStats, TileCacheStats};
pub use types::{CacheAreas, CostStrategy};
