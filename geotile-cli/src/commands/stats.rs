//! Cache statistics command.

use std::path::PathBuf;

use clap::Args;
use geotile::cache::{LoadStats, TileCacheManager, TileCacheStats};
use geotile::config::format_size;
use serde::Serialize;

use super::common::GlobalArgs;
use crate::error::CliError;

/// Arguments for `geotile stats`.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatsReport {
    directory: PathBuf,
    load: LoadStats,
    stats: TileCacheStats,
}

/// Run the stats command.
pub fn run(global: &GlobalArgs, args: StatsArgs) -> Result<(), CliError> {
    let mut cache = TileCacheManager::new(global.cache_config()?);
    let load = cache.init();

    let report = StatsReport {
        directory: cache.directory().to_path_buf(),
        load,
        stats: cache.stats(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Tile cache: {}", report.directory.display());
    println!(
        "  Indexed {} tiles ({}), skipped {} unparseable, {} too large",
        report.load.files_indexed,
        format_size(report.load.total_bytes),
        report.load.skipped_unparseable,
        report.load.skipped_rejected
    );
    println!();
    println!("{}", report.stats);
    Ok(())
}
