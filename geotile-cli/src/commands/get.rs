//! Fetch a tile through the cache tiers.

use std::path::PathBuf;

use clap::Args;
use image::ImageFormat;

use super::common::{GlobalArgs, TileArgs};
use crate::error::CliError;

/// Arguments for `geotile get`.
#[derive(Debug, Args)]
pub struct GetArgs {
    #[command(flatten)]
    pub tile: TileArgs,

    /// Write the decoded tile to this PNG file
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Run the get command.
pub fn run(global: &GlobalArgs, args: GetArgs) -> Result<(), CliError> {
    let spec = args.tile.to_spec()?;
    let mut cache = global.open_cache()?;

    let texture = cache.get(&spec).ok_or_else(|| CliError::NotCached(spec.clone()))?;
    if texture.is_empty() {
        println!("Tile {} is marked as not retrievable", spec);
        return Ok(());
    }

    let image = texture.image();
    println!("Tile {}: {}x{} RGBA", spec, image.width(), image.height());

    if let Some(path) = args.output {
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| CliError::FileWrite {
                path: path.clone(),
                source,
            })?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
