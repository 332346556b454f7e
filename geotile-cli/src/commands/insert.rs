//! Store an image file in the cache.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use super::common::{describe_areas, AreaArg, GlobalArgs, TileArgs};
use crate::error::CliError;

/// Arguments for `geotile insert`.
#[derive(Debug, Args)]
pub struct InsertArgs {
    /// Encoded tile image to store
    pub file: PathBuf,

    #[command(flatten)]
    pub tile: TileArgs,

    /// Image format (defaults to the file extension)
    #[arg(long)]
    pub format: Option<String>,

    /// Tiers to store the tile in
    #[arg(long, value_enum, default_value_t = AreaArg::All)]
    pub area: AreaArg,
}

/// Run the insert command.
pub fn run(global: &GlobalArgs, args: InsertArgs) -> Result<(), CliError> {
    let spec = args.tile.to_spec()?;
    let format = args
        .format
        .clone()
        .or_else(|| {
            args.file
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_lowercase)
        })
        .unwrap_or_else(|| "png".to_string());

    let bytes = fs::read(&args.file).map_err(|source| CliError::FileRead {
        path: args.file.clone(),
        source,
    })?;

    let mut cache = global.open_cache()?;
    let stored = cache.insert(&spec, bytes, &format, args.area.into());
    if stored.is_empty() {
        return Err(CliError::NotStored(spec));
    }

    println!("Stored {} ({}) in: {}", spec, format, describe_areas(stored));
    Ok(())
}
