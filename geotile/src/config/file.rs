//! Configuration file handling for `config.ini`.
//!
//! ```ini
//! [cache]
//! directory = ~/.cache/geotile/tiles/osm
//! plugin = osm
//! disk_size = 50MB
//! memory_size = 3MB
//! texture_size = 6MB
//! disk_cost_strategy = bytesize
//! memory_cost_strategy = bytesize
//! texture_cost_strategy = unitary
//! ```
//!
//! Every key is optional. Sizes are byte sizes for `bytesize` tiers and tile
//! counts for `unitary` tiers; `texture_size` is the headroom kept on top of
//! the renderer's minimum.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::size::{format_size, parse_size};
use crate::cache::{CostStrategy, TileCacheConfig, TierConfig, CACHE_DIR_NAME};

const CACHE_SECTION: &str = "cache";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(#[source] std::io::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFileError {
    fn invalid(key: &str, value: &str, reason: &str) -> Self {
        Self::InvalidValue {
            section: CACHE_SECTION.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Settings from the `[cache]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: Option<PathBuf>,
    pub plugin: Option<String>,
    pub disk_size: Option<u64>,
    pub memory_size: Option<u64>,
    pub texture_size: Option<u64>,
    pub disk_cost_strategy: CostStrategy,
    pub memory_cost_strategy: CostStrategy,
    pub texture_cost_strategy: CostStrategy,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheSettings,
}

impl ConfigFile {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::WriteError)?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(ConfigFileError::WriteError)
    }

    /// Cache configuration described by this file.
    ///
    /// Without an explicit directory the tiles go under the OS cache
    /// directory for the configured plugin, and the legacy flat layout there
    /// is purged on init.
    pub fn to_tile_cache_config(&self) -> TileCacheConfig {
        let settings = &self.cache;
        let plugin = settings.plugin.clone().unwrap_or_else(|| "default".to_string());

        let mut config = match &settings.directory {
            Some(directory) => TileCacheConfig::new(directory),
            None => TileCacheConfig::for_plugin(plugin.clone()),
        };
        config.plugin = plugin;
        config.disk = TierConfig::new(settings.disk_cost_strategy, settings.disk_size);
        config.memory = TierConfig::new(settings.memory_cost_strategy, settings.memory_size);
        config.texture = TierConfig::new(settings.texture_cost_strategy, settings.texture_size);
        config
    }

    fn to_ini(&self) -> Ini {
        let settings = &self.cache;
        let mut entries: Vec<(&str, String)> = Vec::new();
        if let Some(directory) = &settings.directory {
            entries.push(("directory", directory.display().to_string()));
        }
        if let Some(plugin) = &settings.plugin {
            entries.push(("plugin", plugin.clone()));
        }
        for (key, size) in [
            ("disk_size", settings.disk_size),
            ("memory_size", settings.memory_size),
            ("texture_size", settings.texture_size),
        ] {
            if let Some(size) = size {
                entries.push((key, format_size(size)));
            }
        }
        entries.push(("disk_cost_strategy", settings.disk_cost_strategy.to_string()));
        entries.push(("memory_cost_strategy", settings.memory_cost_strategy.to_string()));
        entries.push(("texture_cost_strategy", settings.texture_cost_strategy.to_string()));

        let mut ini = Ini::new();
        for (key, value) in entries {
            ini.with_section(Some(CACHE_SECTION)).set(key, value);
        }
        ini
    }
}

fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    let Some(section) = ini.section(Some(CACHE_SECTION)) else {
        return Ok(config);
    };
    let cache = &mut config.cache;

    if let Some(v) = section.get("directory") {
        let v = v.trim();
        if !v.is_empty() {
            cache.directory = Some(expand_tilde(v));
        }
    }
    if let Some(v) = section.get("plugin") {
        let v = v.trim();
        if !v.is_empty() {
            cache.plugin = Some(v.to_string());
        }
    }

    for (key, slot) in [
        ("disk_size", &mut cache.disk_size),
        ("memory_size", &mut cache.memory_size),
        ("texture_size", &mut cache.texture_size),
    ] {
        if let Some(v) = section.get(key) {
            *slot = Some(parse_size(v).map_err(|_| {
                ConfigFileError::invalid(key, v, "expected format like '50MB', '512KB', or '1000'")
            })?);
        }
    }

    for (key, slot) in [
        ("disk_cost_strategy", &mut cache.disk_cost_strategy),
        ("memory_cost_strategy", &mut cache.memory_cost_strategy),
        ("texture_cost_strategy", &mut cache.texture_cost_strategy),
    ] {
        if let Some(v) = section.get(key) {
            *slot = v
                .parse()
                .map_err(|_| ConfigFileError::invalid(key, v, "must be one of: bytesize, unitary"))?;
        }
    }

    Ok(config)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Get the path to the config directory.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR_NAME)
}

/// Get the path to the config file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
