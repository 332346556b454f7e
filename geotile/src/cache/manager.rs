//! Three-tier tile cache: disk, memory and texture.
//!
//! # Lookup
//!
//! ```text
//!  get(spec)
//!     │
//!     ▼
//!  texture tier ──hit──► decoded image
//!     │ miss
//!     ▼
//!  memory tier ──hit──► decode ──► promote to texture
//!     │ miss
//!     ▼
//!  disk tier ───hit──► read file ──► "NoRetry"? ──► empty texture
//!     │ miss                 │
//!     ▼                      └──► decode ──► promote to memory + texture
//!   None
//! ```
//!
//! Inserts go the other way: fetched bytes land on disk and/or in memory,
//! never directly in the texture tier. Textures only appear by promotion on
//! lookup.
//!
//! # Failure model
//!
//! Nothing here fails outwardly. Unreadable files, undecodable payloads and
//! a cache directory that cannot be created all degrade to cache misses so
//! the caller falls back to fetching the tile again.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bounded::{BoundedCostCache, RemovalCause};
use super::config::TileCacheConfig;
use super::entry::{is_tile_bogus, CacheOwner, DiskTileEntry, MemoryTileEntry, TextureTileEntry};
use super::error::TileCacheError;
use super::migrate::purge_legacy_cache;
use super::stats::{TierStats, TileCacheStats};
use super::types::{CacheAreas, CostStrategy};
use crate::tile::{filename_to_spec, is_tile_filename_candidate, spec_to_filename, TileSpec};

/// Result of scanning the cache directory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Tile files registered in the disk tier.
    pub files_indexed: u64,
    /// Files whose names are not tile filenames.
    pub skipped_unparseable: u64,
    /// Tile files too large for the disk tier on their own.
    pub skipped_rejected: u64,
    /// Total size of the indexed files.
    pub total_bytes: u64,
}

/// Orchestrates the disk, memory and texture tiers of a tile cache.
///
/// The manager is single-owner: every method takes `&mut self` and performs
/// blocking file I/O on the calling thread. Use
/// [`TileCacheService`](super::TileCacheService) to share one across tasks.
pub struct TileCacheManager {
    config: TileCacheConfig,
    directory: PathBuf,
    owner: Arc<CacheOwner>,

    disk: BoundedCostCache<TileSpec, Arc<DiskTileEntry>>,
    memory: BoundedCostCache<TileSpec, Arc<MemoryTileEntry>>,
    texture: BoundedCostCache<TileSpec, Arc<TextureTileEntry>>,

    disk_strategy: CostStrategy,
    memory_strategy: CostStrategy,
    texture_strategy: CostStrategy,
    min_texture_usage: u64,
    extra_texture_usage: u64,

    decode_errors: u64,
    bogus_hits: u64,
}

// Only policy evictions may delete the file behind a disk entry.
fn detach_unless_evicted(_spec: &TileSpec, entry: &Arc<DiskTileEntry>, cause: RemovalCause) {
    if !cause.was_evicted() {
        entry.detach();
    }
}

fn decode_tile(bytes: &[u8]) -> Result<RgbaImage, TileCacheError> {
    Ok(image::load_from_memory(bytes)?.into_rgba8())
}

impl TileCacheManager {
    /// Build a manager from `config` without touching the filesystem.
    ///
    /// Call [`init`](Self::init) before use, or use [`open`](Self::open).
    pub fn new(config: TileCacheConfig) -> Self {
        let directory = config.resolved_directory();
        let min_texture_usage = config.min_texture_usage;
        let extra_texture_usage = config.texture_extra();

        Self {
            directory,
            owner: CacheOwner::new(),
            disk: BoundedCostCache::with_listener(config.disk_capacity(), detach_unless_evicted),
            memory: BoundedCostCache::new(config.memory_capacity()),
            texture: BoundedCostCache::new(min_texture_usage + extra_texture_usage),
            disk_strategy: config.disk.cost_strategy,
            memory_strategy: config.memory.cost_strategy,
            texture_strategy: config.texture.cost_strategy,
            min_texture_usage,
            extra_texture_usage,
            decode_errors: 0,
            bogus_hits: 0,
            config,
        }
    }

    /// Build and initialize a manager.
    pub fn open(config: TileCacheConfig) -> Self {
        let mut manager = Self::new(config);
        manager.init();
        manager
    }

    /// Prepare the cache directory and index the tiles already in it.
    ///
    /// Purges the legacy layout if a legacy root is configured, creates the
    /// tile directory (a failure is logged and the session continues without
    /// persistent tiles), then runs [`load_tiles`](Self::load_tiles).
    pub fn init(&mut self) -> LoadStats {
        if let Some(root) = self.config.legacy_root.clone() {
            if let Err(e) = purge_legacy_cache(&root, &self.config.legacy_dirs) {
                warn!(root = %root.display(), error = %e, "Failed to purge legacy tile cache");
            }
        }

        if let Err(e) = fs::create_dir_all(&self.directory) {
            warn!(
                directory = %self.directory.display(),
                error = %e,
                "Failed to create tile cache directory"
            );
        }

        let loaded = self.load_tiles();
        info!(
            directory = %self.directory.display(),
            disk_capacity = self.disk.max_cost(),
            memory_capacity = self.memory.max_cost(),
            texture_capacity = self.texture.max_cost(),
            tiles = loaded.files_indexed,
            "Tile cache initialized"
        );
        loaded
    }

    /// Register every tile file in the cache directory with the disk tier.
    ///
    /// Files are registered oldest first so the most recently written tiles
    /// end up most recently used. Files whose names do not decode are left
    /// alone.
    pub fn load_tiles(&mut self) -> LoadStats {
        let mut stats = LoadStats::default();

        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(directory = %self.directory.display(), error = %e, "Cannot scan tile directory");
                return stats;
            }
        };

        let mut found = Vec::new();
        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let spec = match entry.file_name().to_str() {
                Some(name) => filename_to_spec(name),
                None => TileSpec::invalid(),
            };
            if !spec.is_valid() {
                stats.skipped_unparseable += 1;
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, entry.path(), spec, metadata.len()));
        }
        found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        for (_, path, spec, size) in found {
            if self.add_existing_to_disk_cache(spec, path, size) {
                stats.files_indexed += 1;
                stats.total_bytes += size;
            } else {
                stats.skipped_rejected += 1;
            }
        }

        debug!(
            indexed = stats.files_indexed,
            skipped = stats.skipped_unparseable,
            rejected = stats.skipped_rejected,
            "Scanned tile directory"
        );
        stats
    }

    /// Look a tile up in every tier, promoting it on the way.
    pub fn get(&mut self, spec: &TileSpec) -> Option<Arc<TextureTileEntry>> {
        self.get_from_memory(spec)
            .or_else(|| self.get_from_disk(spec))
    }

    /// Look a tile up in the texture and memory tiers only.
    pub fn get_from_memory(&mut self, spec: &TileSpec) -> Option<Arc<TextureTileEntry>> {
        if let Some(texture) = self.texture.object(spec) {
            return Some(texture);
        }

        let memory = self.memory.object(spec)?;
        match decode_tile(memory.bytes()) {
            Ok(image) => Some(self.add_to_texture_cache(spec, image)),
            Err(e) => {
                self.handle_error(spec, &e);
                None
            }
        }
    }

    /// Look a tile up in the disk tier, promoting it to memory and texture.
    ///
    /// A non-retriable tile yields an empty texture and is not promoted.
    pub fn get_from_disk(&mut self, spec: &TileSpec) -> Option<Arc<TextureTileEntry>> {
        let entry = self.disk.object(spec)?;

        let bytes = match fs::read(entry.filename()) {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                debug!(tile = %spec, path = %entry.filename().display(), error = %e, "Failed to read tile file");
                self.disk.remove(spec, RemovalCause::Removed);
                return None;
            }
        };

        if is_tile_bogus(&bytes) {
            self.bogus_hits += 1;
            return Some(Arc::new(TextureTileEntry::empty(spec.clone())));
        }

        let image = match decode_tile(&bytes) {
            Ok(image) => image,
            Err(e) => {
                self.handle_error(spec, &e);
                return None;
            }
        };

        self.add_to_memory_cache(spec, bytes, entry.format());
        Some(self.add_to_texture_cache(entry.spec(), image))
    }

    /// Store a fetched tile in the selected tiers.
    ///
    /// Empty payloads are ignored. Non-retriable payloads are kept on disk
    /// only. Returns the tiers that accepted the tile.
    pub fn insert(
        &mut self,
        spec: &TileSpec,
        bytes: impl Into<Bytes>,
        format: &str,
        areas: CacheAreas,
    ) -> CacheAreas {
        let bytes = bytes.into();
        let mut stored = CacheAreas::empty();
        if bytes.is_empty() {
            return stored;
        }

        if areas.contains(CacheAreas::DISK) {
            let filename = spec_to_filename(spec, format, &self.directory);
            if self.add_to_disk_cache(spec, filename, &bytes) {
                stored |= CacheAreas::DISK;
            }
        }

        if areas.contains(CacheAreas::MEMORY) && self.add_to_memory_cache(spec, bytes, format) {
            stored |= CacheAreas::MEMORY;
        }

        stored
    }

    /// Empty all tiers and delete every tile file in the directory.
    ///
    /// Returns the number of files deleted.
    pub fn clear_all(&mut self) -> usize {
        self.texture.clear();
        self.memory.clear();
        self.disk.clear();

        let removed = self.sweep_directory(is_tile_filename_candidate);
        info!(directory = %self.directory.display(), files = removed, "Cleared tile cache");
        removed
    }

    /// Remove every tile of `map_id` from all tiers and from disk.
    ///
    /// After the index-driven removal the directory is swept again for
    /// files of the map that the index did not know about. Returns the
    /// number of files deleted.
    pub fn clear_map_id(&mut self, map_id: i32) -> usize {
        let deleted_before = self.owner.files_deleted();

        for spec in self.texture.keys() {
            if spec.map_id() == map_id {
                self.texture.remove(&spec, RemovalCause::Evicted);
            }
        }
        for spec in self.memory.keys() {
            if spec.map_id() == map_id {
                self.memory.remove(&spec, RemovalCause::Evicted);
            }
        }
        for spec in self.disk.keys() {
            if spec.map_id() == map_id {
                self.disk.remove(&spec, RemovalCause::Evicted);
            }
        }
        let evicted = (self.owner.files_deleted() - deleted_before) as usize;

        let residue = self.sweep_directory(|name| {
            let spec = filename_to_spec(name);
            spec.is_valid() && spec.map_id() == map_id
        });
        if residue > 0 {
            debug!(map_id, residue, "Removed tile files missing from the index");
        }

        info!(map_id, files = evicted + residue, "Cleared map from tile cache");
        evicted + residue
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Specs currently indexed on disk, most recently used first.
    pub fn disk_specs(&self) -> Vec<TileSpec> {
        self.disk.keys()
    }

    /// Whether any tier holds `spec`.
    pub fn contains(&self, spec: &TileSpec) -> bool {
        self.texture.contains(spec) || self.memory.contains(spec) || self.disk.contains(spec)
    }

    pub fn cost_strategy_disk(&self) -> CostStrategy {
        self.disk_strategy
    }

    pub fn cost_strategy_memory(&self) -> CostStrategy {
        self.memory_strategy
    }

    pub fn cost_strategy_texture(&self) -> CostStrategy {
        self.texture_strategy
    }

    /// Change how new disk entries are costed. Existing entries keep
    /// their cost.
    pub fn set_cost_strategy_disk(&mut self, strategy: CostStrategy) {
        self.disk_strategy = strategy;
    }

    /// Change how new memory entries are costed. Existing entries keep
    /// their cost.
    pub fn set_cost_strategy_memory(&mut self, strategy: CostStrategy) {
        self.memory_strategy = strategy;
    }

    /// Change how new texture entries are costed. Existing entries keep
    /// their cost.
    pub fn set_cost_strategy_texture(&mut self, strategy: CostStrategy) {
        self.texture_strategy = strategy;
    }

    pub fn set_max_disk_usage(&mut self, max: u64) {
        self.disk.set_max_cost(max);
    }

    pub fn max_disk_usage(&self) -> u64 {
        self.disk.max_cost()
    }

    pub fn disk_usage(&self) -> u64 {
        self.disk.total_cost()
    }

    pub fn set_max_memory_usage(&mut self, max: u64) {
        self.memory.set_max_cost(max);
    }

    pub fn max_memory_usage(&self) -> u64 {
        self.memory.max_cost()
    }

    pub fn memory_usage(&self) -> u64 {
        self.memory.total_cost()
    }

    /// Set the texture capacity needed for the visible tiles.
    pub fn set_min_texture_usage(&mut self, min: u64) {
        self.min_texture_usage = min;
        self.texture
            .set_max_cost(self.min_texture_usage + self.extra_texture_usage);
    }

    /// Set the texture capacity kept on top of the minimum.
    pub fn set_extra_texture_usage(&mut self, extra: u64) {
        self.extra_texture_usage = extra;
        self.texture
            .set_max_cost(self.min_texture_usage + self.extra_texture_usage);
    }

    pub fn min_texture_usage(&self) -> u64 {
        self.min_texture_usage
    }

    pub fn extra_texture_usage(&self) -> u64 {
        self.extra_texture_usage
    }

    pub fn max_texture_usage(&self) -> u64 {
        self.texture.max_cost()
    }

    pub fn texture_usage(&self) -> u64 {
        self.texture.total_cost()
    }

    pub fn stats(&self) -> TileCacheStats {
        TileCacheStats {
            disk: tier_stats(&self.disk, self.disk_strategy),
            memory: tier_stats(&self.memory, self.memory_strategy),
            texture: tier_stats(&self.texture, self.texture_strategy),
            files_deleted: self.owner.files_deleted(),
            memory_bytes_released: self.owner.memory_bytes_released(),
            decode_errors: self.decode_errors,
            bogus_hits: self.bogus_hits,
        }
    }

    fn add_to_disk_cache(&mut self, spec: &TileSpec, filename: PathBuf, bytes: &[u8]) -> bool {
        // The file could not be indexed again by the next session.
        if !spec.is_encodable() {
            debug!(tile = %spec, "Tile key has no file name encoding, not stored on disk");
            return false;
        }

        // A tile stored earlier under another format leaves its file behind
        // once replaced; remember it so it can be deleted.
        let stale = self
            .disk
            .peek(spec)
            .filter(|old| old.filename() != filename)
            .map(Arc::clone);

        let entry = Arc::new(DiskTileEntry::new(spec.clone(), filename, &self.owner));
        let cost = self.disk_strategy.cost(bytes.len() as u64);

        // Register before writing so a rejected tile never overwrites a file
        // from an earlier session.
        if !self.disk.insert(spec.clone(), Arc::clone(&entry), cost) {
            entry.detach();
            debug!(tile = %spec, cost, "Tile too large for disk cache");
            return false;
        }

        if let Err(e) = fs::write(entry.filename(), bytes) {
            debug!(tile = %spec, path = %entry.filename().display(), error = %e, "Failed to write tile file");
            self.disk.remove(spec, RemovalCause::Removed);
            return false;
        }

        if let Some(stale) = stale {
            if let Err(e) = fs::remove_file(stale.filename()) {
                debug!(path = %stale.filename().display(), error = %e, "Failed to remove replaced tile file");
            }
        }
        true
    }

    fn add_existing_to_disk_cache(&mut self, spec: TileSpec, filename: PathBuf, size: u64) -> bool {
        let entry = Arc::new(DiskTileEntry::new(spec.clone(), filename, &self.owner));
        let cost = self.disk_strategy.cost(size);
        if self.disk.insert(spec, Arc::clone(&entry), cost) {
            true
        } else {
            entry.detach();
            false
        }
    }

    fn add_to_memory_cache(&mut self, spec: &TileSpec, bytes: Bytes, format: &str) -> bool {
        if is_tile_bogus(&bytes) {
            return false;
        }
        let cost = self.memory_strategy.cost(bytes.len() as u64);
        let entry = Arc::new(MemoryTileEntry::new(spec.clone(), bytes, format, &self.owner));
        self.memory.insert(spec.clone(), entry, cost)
    }

    fn add_to_texture_cache(&mut self, spec: &TileSpec, image: RgbaImage) -> Arc<TextureTileEntry> {
        let texture = Arc::new(TextureTileEntry::new(spec.clone(), image));
        let cost = self.texture_strategy.cost(texture.byte_size());
        if !self.texture.insert(spec.clone(), Arc::clone(&texture), cost) {
            debug!(tile = %spec, cost, "Texture too large for texture cache");
        }
        texture
    }

    fn handle_error(&mut self, spec: &TileSpec, error: &dyn fmt::Display) {
        self.decode_errors += 1;
        warn!(tile = %spec, error = %error, "Tile error");
    }

    /// Delete files in the cache directory whose names satisfy `matches`.
    fn sweep_directory(&self, matches: impl Fn(&str) -> bool) -> usize {
        let Ok(entries) = fs::read_dir(&self.directory) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if matches(name) && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

impl Drop for TileCacheManager {
    fn drop(&mut self) {
        // Detach every disk entry before the index goes away so the files
        // stay for the next run.
        let kept = self.disk.len();
        self.disk.clear();
        debug!(directory = %self.directory.display(), tiles = kept, "Tile cache closed");
    }
}

impl fmt::Debug for TileCacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCacheManager")
            .field("directory", &self.directory)
            .field("disk", &self.disk)
            .field("memory", &self.memory)
            .field("texture", &self.texture)
            .finish()
    }
}

fn tier_stats<V>(cache: &BoundedCostCache<TileSpec, V>, strategy: CostStrategy) -> TierStats {
    TierStats {
        cost_strategy: strategy,
        entries: cache.len(),
        usage: cache.total_cost(),
        capacity: cache.max_cost(),
        counters: cache.stats(),
    }
}
