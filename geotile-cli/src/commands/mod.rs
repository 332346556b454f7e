//! CLI command implementations.
//!
//! - [`stats`] - Load the cache and report per-tier usage
//! - [`list`] - List tile files in the cache directory
//! - [`clear`] - Delete all tiles, or the tiles of one map
//! - [`insert`] - Store an image file as a tile
//! - [`get`] - Fetch a tile through the cache tiers

pub mod clear;
pub mod common;
pub mod get;
pub mod insert;
pub mod list;
pub mod stats;
