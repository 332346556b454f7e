//! Tile cache configuration.
//!
//! All tier settings are fixed when the manager is built. Tiers without an
//! explicit capacity get a default that depends on their cost strategy:
//!
//! | Tier    | `ByteSize`          | `Unitary` |
//! |---------|---------------------|-----------|
//! | disk    | 50 MiB              | 1000      |
//! | memory  | 3 MiB               | 100       |
//! | texture | min + 6 MiB extra   | min + 30  |

use std::path::PathBuf;

use super::types::CostStrategy;

/// Default disk capacity for the `ByteSize` strategy.
pub const DEFAULT_DISK_BYTES: u64 = 50 * 1024 * 1024;
/// Default memory capacity for the `ByteSize` strategy.
pub const DEFAULT_MEMORY_BYTES: u64 = 3 * 1024 * 1024;
/// Default texture headroom for the `ByteSize` strategy.
pub const DEFAULT_TEXTURE_EXTRA_BYTES: u64 = 6 * 1024 * 1024;

pub const DEFAULT_DISK_UNITS: u64 = 1000;
pub const DEFAULT_MEMORY_UNITS: u64 = 100;
pub const DEFAULT_TEXTURE_EXTRA_UNITS: u64 = 30;

/// Name of the application directory inside the OS cache directory.
pub const CACHE_DIR_NAME: &str = "geotile";

/// Per-plugin directories written by the flat, pre-versioned layout.
pub const LEGACY_PLUGIN_DIRS: [&str; 3] = ["osm", "mapbox", "here"];

/// Root of all geotile caches (`~/.cache/geotile` on Linux).
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
}

/// Tile directory used for `plugin` when none is configured.
pub fn default_tile_directory(plugin: &str) -> PathBuf {
    default_cache_root().join("tiles").join(plugin)
}

/// Settings for one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierConfig {
    /// How entries are costed.
    pub cost_strategy: CostStrategy,
    /// Capacity in cost units; `None` picks the tier default.
    pub max_cost: Option<u64>,
}

impl TierConfig {
    pub fn new(cost_strategy: CostStrategy, max_cost: Option<u64>) -> Self {
        Self {
            cost_strategy,
            max_cost,
        }
    }

    /// Configured capacity, or the default for the current strategy.
    pub fn resolve(&self, default_bytes: u64, default_units: u64) -> u64 {
        self.max_cost.unwrap_or(match self.cost_strategy {
            CostStrategy::ByteSize => default_bytes,
            CostStrategy::Unitary => default_units,
        })
    }
}

/// Configuration for a [`TileCacheManager`](super::TileCacheManager).
#[derive(Debug, Clone)]
pub struct TileCacheConfig {
    /// Directory holding tile files; `None` uses [`default_tile_directory`].
    pub directory: Option<PathBuf>,

    /// Plugin name, used for the default directory.
    pub plugin: String,

    /// Directory whose flat legacy layout is purged on init.
    pub legacy_root: Option<PathBuf>,

    /// Subdirectories of `legacy_root` removed on init.
    pub legacy_dirs: Vec<String>,

    pub disk: TierConfig,
    pub memory: TierConfig,

    /// Texture tier; `max_cost` is the headroom added on top of
    /// `min_texture_usage`.
    pub texture: TierConfig,

    /// Texture capacity the renderer needs for the visible tiles.
    pub min_texture_usage: u64,
}

impl TileCacheConfig {
    /// Cache tiles in `directory` with default tiers.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            ..Self::default()
        }
    }

    /// Cache tiles for `plugin` under the OS cache directory, purging any
    /// flat legacy layout found there.
    pub fn for_plugin(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            legacy_root: Some(default_cache_root()),
            ..Self::default()
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_legacy_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.legacy_root = Some(root.into());
        self
    }

    pub fn with_disk(mut self, cost_strategy: CostStrategy, max_cost: Option<u64>) -> Self {
        self.disk = TierConfig::new(cost_strategy, max_cost);
        self
    }

    pub fn with_memory(mut self, cost_strategy: CostStrategy, max_cost: Option<u64>) -> Self {
        self.memory = TierConfig::new(cost_strategy, max_cost);
        self
    }

    pub fn with_texture(mut self, cost_strategy: CostStrategy, extra_cost: Option<u64>) -> Self {
        self.texture = TierConfig::new(cost_strategy, extra_cost);
        self
    }

    pub fn with_min_texture_usage(mut self, min: u64) -> Self {
        self.min_texture_usage = min;
        self
    }

    /// Use the same cost strategy for all tiers, keeping capacities.
    pub fn with_cost_strategy(mut self, cost_strategy: CostStrategy) -> Self {
        self.disk.cost_strategy = cost_strategy;
        self.memory.cost_strategy = cost_strategy;
        self.texture.cost_strategy = cost_strategy;
        self
    }

    /// The directory tiles will be written to.
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| default_tile_directory(&self.plugin))
    }

    pub fn disk_capacity(&self) -> u64 {
        self.disk.resolve(DEFAULT_DISK_BYTES, DEFAULT_DISK_UNITS)
    }

    pub fn memory_capacity(&self) -> u64 {
        self.memory.resolve(DEFAULT_MEMORY_BYTES, DEFAULT_MEMORY_UNITS)
    }

    pub fn texture_extra(&self) -> u64 {
        self.texture
            .resolve(DEFAULT_TEXTURE_EXTRA_BYTES, DEFAULT_TEXTURE_EXTRA_UNITS)
    }
}

impl Default for TileCacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            plugin: "default".to_string(),
            legacy_root: None,
            legacy_dirs: LEGACY_PLUGIN_DIRS.iter().map(|d| d.to_string()).collect(),
            disk: TierConfig::default(),
            memory: TierConfig::default(),
            texture: TierConfig::default(),
            min_texture_usage: 0,
        }
    }
}
