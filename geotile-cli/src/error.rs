//! CLI error handling with user-friendly messages.

use std::path::PathBuf;
use std::process;

use geotile::config::ConfigFileError;
use geotile::tile::TileSpec;
use thiserror::Error;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(#[source] std::io::Error),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    /// Bad command line value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to read an input file
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output image
    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to scan the cache directory
    #[error("Failed to read cache directory '{path}': {source}")]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Requested tile is in none of the tiers
    #[error("Tile {0} is not cached")]
    NotCached(TileSpec),

    /// Failed to serialize output
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    /// Nothing was stored by an insert
    #[error("Tile {0} was not stored in any cache tier")]
    NotStored(TileSpec),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::NotStored(_) = self {
            eprintln!();
            eprintln!("Common causes:");
            eprintln!("  1. The tile is larger than the tier capacity");
            eprintln!("  2. The cache directory is not writable");
        }

        let code = match self {
            CliError::NotCached(_) => 2,
            _ => 1,
        };
        process::exit(code)
    }
}
