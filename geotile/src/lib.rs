//! Geotile - disk, memory and texture cache for map tiles
//!
//! Tiles fetched by a map plugin are identified by a [`tile::TileSpec`] and
//! cached in three bounded tiers:
//!
//! - **disk**: encoded tiles as files named after their spec, surviving
//!   restarts
//! - **memory**: encoded tile bytes
//! - **texture**: decoded RGBA images ready for rendering
//!
//! Each tier is a strict-LRU [`cache::BoundedCostCache`] whose capacity is
//! counted either in bytes or in tiles ([`cache::CostStrategy`]).
//!
//! # Example
//!
//! ```no_run
//! use geotile::cache::{CacheAreas, TileCacheConfig, TileCacheManager};
//! use geotile::tile::TileSpec;
//!
//! let mut cache = TileCacheManager::open(TileCacheConfig::for_plugin("osm"));
//! let spec = TileSpec::unversioned("osm", 1, 12, 2200, 1343);
//!
//! let png = std::fs::read("tile.png").unwrap();
//! cache.insert(&spec, png, "png", CacheAreas::ALL);
//!
//! if let Some(texture) = cache.get(&spec) {
//!     println!("{}x{}", texture.image().width(), texture.image().height());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod logging;
pub mod tile;
