//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use geotile::cache::{CacheAreas, TileCacheConfig, TileCacheManager};
use geotile::config::ConfigFile;
use geotile::tile::TileSpec;

use crate::error::CliError;

/// Options shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Tile cache directory, overriding the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Write logs to this directory as well as stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// Cache configuration from the config file and command line.
    pub fn cache_config(&self) -> Result<TileCacheConfig, CliError> {
        let file = match &self.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let mut config = file.to_tile_cache_config();
        if let Some(dir) = &self.dir {
            // An explicit directory is never treated as a legacy cache root.
            config = config.with_directory(dir);
            config.legacy_root = None;
        }
        Ok(config)
    }

    /// Open and initialize the cache.
    pub fn open_cache(&self) -> Result<TileCacheManager, CliError> {
        Ok(TileCacheManager::open(self.cache_config()?))
    }
}

/// Tile identity given on the command line.
#[derive(Debug, Clone, Args)]
pub struct TileArgs {
    /// Map plugin name (e.g. osm)
    #[arg(long)]
    pub plugin: String,

    /// Map type within the plugin
    #[arg(long)]
    pub map_id: i32,

    /// Zoom level
    #[arg(long)]
    pub zoom: i32,

    /// Tile column
    #[arg(long)]
    pub x: i32,

    /// Tile row
    #[arg(long)]
    pub y: i32,

    /// Map version, -1 for unversioned
    #[arg(long, default_value_t = TileSpec::UNVERSIONED, allow_negative_numbers = true)]
    pub version: i32,
}

impl TileArgs {
    /// Validate into a [`TileSpec`] that survives the filename encoding.
    pub fn to_spec(&self) -> Result<TileSpec, CliError> {
        let spec = TileSpec::new(
            self.plugin.as_str(),
            self.map_id,
            self.zoom,
            self.x,
            self.y,
            self.version,
        );
        if !spec.is_encodable() {
            return Err(CliError::InvalidArgument(format!(
                "tile {spec} cannot be stored: the plugin must be non-empty without '-' or '.', \
                 map id, zoom, x and y must not be negative, and version must be -1 or above"
            )));
        }
        Ok(spec)
    }
}

/// Cache tier selection for CLI arguments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AreaArg {
    /// Persist as a file only
    Disk,
    /// Keep in memory only (lost when the command exits)
    Memory,
    /// Both disk and memory
    #[default]
    All,
}

impl From<AreaArg> for CacheAreas {
    fn from(area: AreaArg) -> Self {
        match area {
            AreaArg::Disk => CacheAreas::DISK,
            AreaArg::Memory => CacheAreas::MEMORY,
            AreaArg::All => CacheAreas::ALL,
        }
    }
}

/// Names of the tiers in `areas`, for display.
pub fn describe_areas(areas: CacheAreas) -> String {
    let mut names = Vec::new();
    if areas.contains(CacheAreas::DISK) {
        names.push("disk");
    }
    if areas.contains(CacheAreas::MEMORY) {
        names.push("memory");
    }
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tile_args(plugin: &str, zoom: i32) -> TileArgs {
        TileArgs {
            plugin: plugin.to_string(),
            map_id: 1,
            zoom,
            x: 2,
            y: 3,
            version: TileSpec::UNVERSIONED,
        }
    }

    #[test]
    fn test_to_spec() {
        let spec = tile_args("osm", 4).to_spec().unwrap();
        assert_eq!(spec, TileSpec::unversioned("osm", 1, 4, 2, 3));
    }

    #[test]
    fn test_to_spec_rejects_unencodable_values() {
        assert!(tile_args("open-street", 4).to_spec().is_err());
        assert!(tile_args("osm.v2", 4).to_spec().is_err());
        assert!(tile_args("", 4).to_spec().is_err());
        assert!(tile_args("osm", -1).to_spec().is_err());

        let negative_map = TileArgs {
            map_id: -1,
            ..tile_args("osm", 4)
        };
        assert!(negative_map.to_spec().is_err());

        let negative_row = TileArgs {
            y: -3,
            ..tile_args("osm", 4)
        };
        assert!(negative_row.to_spec().is_err());

        let bad_version = TileArgs {
            version: -2,
            ..tile_args("osm", 4)
        };
        assert!(bad_version.to_spec().is_err());
    }

    #[test]
    fn test_area_conversion() {
        assert_eq!(CacheAreas::from(AreaArg::Disk), CacheAreas::DISK);
        assert_eq!(CacheAreas::from(AreaArg::All), CacheAreas::ALL);
        assert_eq!(describe_areas(CacheAreas::ALL), "disk, memory");
        assert_eq!(describe_areas(CacheAreas::empty()), "none");
    }

    #[test]
    fn test_dir_overrides_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.ini");
        std::fs::write(&config_path, "[cache]\ndirectory = /nowhere\nmemory_size = 1MB\n").unwrap();

        let args = GlobalArgs {
            config: Some(config_path),
            dir: Some(temp.path().join("tiles")),
            log_dir: None,
        };
        let config = args.cache_config().unwrap();

        assert_eq!(config.resolved_directory(), temp.path().join("tiles"));
        assert_eq!(config.memory_capacity(), 1024 * 1024);
        assert!(config.legacy_root.is_none());
    }
}
