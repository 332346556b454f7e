//! Tile filename codec.
//!
//! Tiles are persisted one per file, with the tile identity encoded in the
//! filename:
//!
//! `{plugin}-{map_id}-{zoom}-{x}-{y}[-{version}].{format}`
//!
//! Examples:
//! - `osm-1-3-4-5.png` (unversioned)
//! - `osm-1-3-4-5-2.png` (version 2)
//!
//! The version segment is left out for unversioned tiles so that caches
//! written before tiles carried versions keep decoding to the same specs.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use glob::Pattern;
use thiserror::Error;

use super::TileSpec;

/// Glob matching every name the codec can produce.
pub const TILE_FILENAME_GLOB: &str = "*-*-*-*.*";

/// Error decoding a tile filename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameError {
    /// The name does not consist of exactly one stem and one extension
    #[error("expected exactly one '.' separating name and format, found {0} parts")]
    WrongExtensionCount(usize),

    /// The stem does not have 5 or 6 dash-separated fields
    #[error("expected 5 or 6 '-' separated fields, found {0}")]
    WrongFieldCount(usize),

    /// A numeric field failed to parse
    #[error("invalid {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

const NUMERIC_FIELDS: [&str; 5] = ["map id", "zoom", "x", "y", "version"];

/// Build the path of the file holding `spec` in `directory`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use geotile::tile::{spec_to_filename, TileSpec};
///
/// let spec = TileSpec::unversioned("osm", 1, 3, 4, 5);
/// assert_eq!(
///     spec_to_filename(&spec, "png", Path::new("/cache")),
///     Path::new("/cache/osm-1-3-4-5.png")
/// );
///
/// let spec = TileSpec::new("osm", 1, 3, 4, 5, 2);
/// assert_eq!(
///     spec_to_filename(&spec, "png", Path::new("/cache")),
///     Path::new("/cache/osm-1-3-4-5-2.png")
/// );
/// ```
pub fn spec_to_filename(spec: &TileSpec, format: &str, directory: &Path) -> PathBuf {
    directory.join(tile_file_name(spec, format))
}

/// The bare file name (no directory) for `spec`.
pub fn tile_file_name(spec: &TileSpec, format: &str) -> String {
    let mut name = format!(
        "{}-{}-{}-{}-{}",
        spec.plugin(),
        spec.map_id(),
        spec.zoom(),
        spec.x(),
        spec.y()
    );
    if spec.is_versioned() {
        name.push('-');
        name.push_str(&spec.version().to_string());
    }
    name.push('.');
    name.push_str(format);
    name
}

/// Decode a tile file name, reporting why it was rejected.
pub fn parse_tile_filename(filename: &str) -> Result<TileSpec, FilenameError> {
    let parts: Vec<&str> = filename.split('.').collect();
    if parts.len() != 2 {
        return Err(FilenameError::WrongExtensionCount(parts.len()));
    }

    let fields: Vec<&str> = parts[0].split('-').collect();
    if fields.len() != 5 && fields.len() != 6 {
        return Err(FilenameError::WrongFieldCount(fields.len()));
    }

    let mut numbers = Vec::with_capacity(5);
    for (value, field) in fields[1..].iter().zip(NUMERIC_FIELDS) {
        let number = value
            .parse::<i32>()
            .map_err(|_| FilenameError::InvalidNumber {
                field,
                value: value.to_string(),
            })?;
        numbers.push(number);
    }
    if numbers.len() < 5 {
        numbers.push(TileSpec::UNVERSIONED);
    }

    Ok(TileSpec::new(
        fields[0], numbers[0], numbers[1], numbers[2], numbers[3], numbers[4],
    ))
}

/// Decode a tile file name, returning [`TileSpec::invalid`] on any mismatch.
pub fn filename_to_spec(filename: &str) -> TileSpec {
    parse_tile_filename(filename).unwrap_or_else(|_| TileSpec::invalid())
}

fn tile_glob() -> &'static Pattern {
    static PATTERN: OnceLock<Pattern> = OnceLock::new();
    PATTERN.get_or_init(|| Pattern::new(TILE_FILENAME_GLOB).expect("tile glob is a valid pattern"))
}

/// Whether a file name looks like something the codec wrote.
///
/// This is a loose shape check used for bulk deletion; it does not validate
/// the numeric fields.
pub fn is_tile_filename_candidate(filename: &str) -> bool {
    tile_glob().matches(filename)
}
