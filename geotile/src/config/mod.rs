//! File-based configuration for the tile cache.
//!
//! The cache itself is configured with [`TileCacheConfig`](crate::cache::TileCacheConfig);
//! this module reads one from an INI file.

mod file;
mod size;

pub use file::{config_directory, config_file_path, CacheSettings, ConfigFile, ConfigFileError};
pub use size::{format_size, parse_size, SizeParseError};
