//! Cache clearing command.

use clap::Args;

use super::common::GlobalArgs;
use crate::error::CliError;

/// Arguments for `geotile clear`.
#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Only remove tiles of this map type
    #[arg(long)]
    pub map_id: Option<i32>,
}

/// Run the clear command.
pub fn run(global: &GlobalArgs, args: ClearArgs) -> Result<(), CliError> {
    let mut cache = global.open_cache()?;

    let deleted = match args.map_id {
        Some(map_id) => {
            println!(
                "Clearing map {} from: {}",
                map_id,
                cache.directory().display()
            );
            cache.clear_map_id(map_id)
        }
        None => {
            println!("Clearing tile cache at: {}", cache.directory().display());
            cache.clear_all()
        }
    };

    println!("Deleted {} files", deleted);
    Ok(())
}
