//! List tile files in the cache directory.

use std::fs;

use clap::Args;
use geotile::config::format_size;
use geotile::tile::parse_tile_filename;
use tracing::debug;

use super::common::GlobalArgs;
use crate::error::CliError;

/// Arguments for `geotile list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only list tiles of this map type
    #[arg(long)]
    pub map_id: Option<i32>,
}

/// Run the list command.
///
/// Reads the directory without opening the cache, so nothing is evicted
/// or purged.
pub fn run(global: &GlobalArgs, args: ListArgs) -> Result<(), CliError> {
    let directory = global.cache_config()?.resolved_directory();
    let entries = fs::read_dir(&directory).map_err(|source| CliError::CacheDirectory {
        path: directory.clone(),
        source,
    })?;

    let mut tiles = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let spec = match parse_tile_filename(name) {
            Ok(spec) => spec,
            Err(e) => {
                debug!(file = name, error = %e, "Skipping non-tile file");
                continue;
            }
        };
        if args.map_id.is_some_and(|map_id| spec.map_id() != map_id) {
            continue;
        }
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        tiles.push((spec, size, name.to_string()));
    }
    tiles.sort();

    let total: u64 = tiles.iter().map(|(_, size, _)| size).sum();
    for (spec, size, name) in &tiles {
        println!("{:<32} {:>8}  {}", spec.to_string(), format_size(*size), name);
    }
    println!("{} tiles, {}", tiles.len(), format_size(total));
    Ok(())
}
