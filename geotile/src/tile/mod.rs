//! Tile identity and its on-disk filename encoding.

mod filename;
mod spec;

pub use filename::{
    filename_to_spec, is_tile_filename_candidate, parse_tile_filename, spec_to_filename,
    tile_file_name, FilenameError, TILE_FILENAME_GLOB,
};
pub use spec::TileSpec;
