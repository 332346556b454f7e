//! Geotile CLI - inspect and maintain map tile caches

mod commands;
mod error;

use clap::{Parser, Subcommand};
use geotile::logging::{default_log_file, init_logging, init_stderr_logging, LoggingGuard};

use commands::clear::ClearArgs;
use commands::common::GlobalArgs;
use commands::get::GetArgs;
use commands::insert::InsertArgs;
use commands::list::ListArgs;
use commands::stats::StatsArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "geotile")]
#[command(version, about = "Inspect and maintain map tile caches", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show per-tier usage of the cache
    ///
    /// Opens the cache the way the library does: the legacy cache layout is
    /// purged, and tile files beyond the configured disk budget are evicted
    /// and deleted. Use `list` to inspect the directory without changes.
    Stats(StatsArgs),
    /// List tile files in the cache directory
    List(ListArgs),
    /// Delete cached tiles
    Clear(ClearArgs),
    /// Store an image file as a tile
    Insert(InsertArgs),
    /// Look a tile up through the cache tiers
    Get(GetArgs),
}

fn init_cli_logging(global: &GlobalArgs) -> Result<LoggingGuard, CliError> {
    match &global.log_dir {
        Some(dir) => init_logging(dir, default_log_file()).map_err(CliError::LoggingInit),
        None => Ok(init_stderr_logging()),
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _logging = init_cli_logging(&cli.global)?;
    let global = &cli.global;

    match cli.command {
        Commands::Stats(args) => commands::stats::run(global, args),
        Commands::List(args) => commands::list::run(global, args),
        Commands::Clear(args) => commands::clear::run(global, args),
        Commands::Insert(args) => commands::insert::run(global, args),
        Commands::Get(args) => commands::get::run(global, args),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_insert() {
        let cli = Cli::try_parse_from([
            "geotile", "--dir", "/tmp/tiles", "insert", "tile.png", "--plugin", "osm",
            "--map-id", "1", "--zoom", "12", "--x", "5", "--y", "6", "--version", "3",
            "--area", "disk",
        ])
        .unwrap();

        assert_eq!(cli.global.dir.as_deref(), Some(std::path::Path::new("/tmp/tiles")));
        let Commands::Insert(args) = cli.command else {
            panic!("expected insert");
        };
        assert_eq!(args.tile.zoom, 12);
        assert_eq!(args.tile.version, 3);
        assert_eq!(args.area, commands::common::AreaArg::Disk);
        assert!(args.format.is_none());
    }

    #[test]
    fn test_parse_get_defaults_to_unversioned() {
        let cli = Cli::try_parse_from([
            "geotile", "get", "--plugin", "osm", "--map-id", "1", "--zoom", "2", "--x", "0",
            "--y", "0",
        ])
        .unwrap();
        let Commands::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.tile.version, -1);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["geotile", "clear", "--map-id", "4", "--dir", "/srv/tiles"])
            .unwrap();
        assert!(cli.global.dir.is_some());
        assert!(matches!(cli.command, Commands::Clear(ClearArgs { map_id: Some(4) })));
    }

    #[test]
    fn test_stats_help_warns_about_side_effects() {
        let cli = Cli::command();
        let stats = cli.find_subcommand("stats").unwrap();
        let help = stats.get_long_about().unwrap().to_string();
        assert!(help.contains("purged"));
        assert!(help.contains("evicted and deleted"));
    }

    #[test]
    fn test_missing_tile_fields_are_rejected() {
        assert!(Cli::try_parse_from(["geotile", "get", "--plugin", "osm"]).is_err());
    }
}
