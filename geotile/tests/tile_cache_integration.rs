//! Integration tests for the tile cache.
//!
//! These tests drive the public API the way a map plugin does:
//! - Tiles fetched during one session are served from disk in the next
//! - Tiers evict under pressure and keep files in step with the index
//! - The async service serves concurrent callers from one cache
//! - A configuration file drives tier sizing
//!
//! Run with: `cargo test --test tile_cache_integration`

use std::fs;
use std::io::Cursor;

use geotile::cache::{
    CacheAreas, CostStrategy, TileCacheConfig, TileCacheManager, TileCacheService,
};
use geotile::config::ConfigFile;
use geotile::tile::{filename_to_spec, spec_to_filename, TileSpec};
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode a solid tile as PNG.
fn png_tile(size: u32, shade: u8) -> Vec<u8> {
    let image = RgbaImage::from_pixel(size, size, Rgba([shade, shade, shade, 255]));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// Tiles of a small viewport at zoom 14.
fn viewport(map_id: i32) -> Vec<TileSpec> {
    let mut tiles = Vec::new();
    for x in 8800..8804 {
        for y in 5370..5373 {
            tiles.push(TileSpec::new("osm", map_id, 14, x, y, 2));
        }
    }
    tiles
}

fn tile_files(dir: &TempDir) -> Vec<TileSpec> {
    let mut specs: Vec<TileSpec> = fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter_map(|e| e.file_name().to_str().map(filename_to_spec))
        .filter(TileSpec::is_valid)
        .collect();
    specs.sort();
    specs
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Tiles inserted in one session are served from disk after a restart, and
/// every lookup promotes them into the faster tiers.
#[test]
fn test_tiles_persist_across_sessions() {
    let dir = TempDir::new().unwrap();
    let tiles = viewport(1);

    {
        let mut cache = TileCacheManager::open(TileCacheConfig::new(dir.path()));
        for (i, spec) in tiles.iter().enumerate() {
            let stored = cache.insert(spec, png_tile(16, i as u8), "png", CacheAreas::ALL);
            assert_eq!(stored, CacheAreas::ALL);
        }
    }

    let mut expected = tiles.clone();
    expected.sort();
    assert_eq!(tile_files(&dir), expected);

    let mut cache = TileCacheManager::new(TileCacheConfig::new(dir.path()));
    let loaded = cache.init();
    assert_eq!(loaded.files_indexed, tiles.len() as u64);

    for (i, spec) in tiles.iter().enumerate() {
        let texture = cache.get(spec).expect("tile should survive restart");
        assert_eq!(texture.image().get_pixel(0, 0), &Rgba([i as u8, i as u8, i as u8, 255]));
    }

    let stats = cache.stats();
    assert_eq!(stats.memory.entries, tiles.len());
    assert_eq!(stats.texture.entries, tiles.len());
    assert_eq!(stats.texture.usage, tiles.len() as u64 * 16 * 16 * 4);
}

/// With a unitary disk budget, panning across the map keeps only the most
/// recently used tiles on disk.
#[test]
fn test_disk_budget_keeps_recent_tiles() {
    let dir = TempDir::new().unwrap();
    let mut cache = TileCacheManager::open(
        TileCacheConfig::new(dir.path()).with_disk(CostStrategy::Unitary, Some(5)),
    );
    let tiles = viewport(1);
    let png = png_tile(8, 100);

    for spec in &tiles {
        cache.insert(spec, png.clone(), "png", CacheAreas::DISK);
    }

    let mut recent = tiles[tiles.len() - 5..].to_vec();
    recent.sort();
    assert_eq!(tile_files(&dir), recent);
    assert_eq!(cache.disk_usage(), 5);
    assert_eq!(cache.stats().files_deleted, (tiles.len() - 5) as u64);
}

/// Reopening with a smaller disk budget evicts the oldest files on startup.
#[test]
fn test_restart_with_smaller_budget_trims_oldest() {
    let dir = TempDir::new().unwrap();
    let tiles = viewport(1);
    let png = png_tile(8, 50);

    {
        let mut cache = TileCacheManager::open(TileCacheConfig::new(dir.path()));
        for spec in &tiles {
            cache.insert(spec, png.clone(), "png", CacheAreas::DISK);
        }
    }

    let cache = TileCacheManager::open(
        TileCacheConfig::new(dir.path()).with_disk(CostStrategy::Unitary, Some(3)),
    );
    assert_eq!(cache.disk_specs().len(), 3);
    assert_eq!(tile_files(&dir).len(), 3);
}

/// A failed fetch recorded as non-retriable is remembered across sessions.
#[test]
fn test_non_retriable_tile_persists() {
    let dir = TempDir::new().unwrap();
    let spec = TileSpec::unversioned("osm", 3, 9, 1, 1);

    {
        let mut cache = TileCacheManager::open(TileCacheConfig::new(dir.path()));
        cache.insert(&spec, &b"NoRetry"[..], "png", CacheAreas::ALL);
    }
    assert_eq!(
        fs::read(spec_to_filename(&spec, "png", dir.path())).unwrap(),
        b"NoRetry"
    );

    let mut cache = TileCacheManager::open(TileCacheConfig::new(dir.path()));
    assert!(cache.get(&spec).unwrap().is_empty());
    assert!(cache.get(&spec).unwrap().is_empty());
    assert_eq!(cache.stats().bogus_hits, 2);
}

/// Clearing one map type leaves the other map types usable.
#[test]
fn test_clear_map_id_across_maps() {
    let dir = TempDir::new().unwrap();
    let mut cache = TileCacheManager::open(TileCacheConfig::new(dir.path()));
    let png = png_tile(8, 10);

    for map_id in [1, 2] {
        for spec in viewport(map_id) {
            cache.insert(&spec, png.clone(), "png", CacheAreas::ALL);
        }
    }
    for spec in viewport(1) {
        cache.get(&spec);
    }

    let removed = cache.clear_map_id(1);
    assert_eq!(removed, viewport(1).len());
    assert!(tile_files(&dir).iter().all(|spec| spec.map_id() == 2));
    assert_eq!(cache.stats().texture.entries, 0);
    for spec in viewport(2) {
        assert!(cache.get(&spec).is_some());
    }
}

/// Several tasks share one cache through the service.
#[tokio::test]
async fn test_service_serves_concurrent_tasks() {
    let dir = TempDir::new().unwrap();
    let service = TileCacheService::start(TileCacheConfig::new(dir.path())).unwrap();

    let mut tasks = Vec::new();
    for (i, spec) in viewport(1).into_iter().enumerate() {
        let cache = service.handle();
        tasks.push(tokio::spawn(async move {
            cache
                .insert(spec.clone(), png_tile(8, i as u8), "png", CacheAreas::ALL)
                .await
                .unwrap();
            cache.get(spec).await.unwrap().is_some()
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap());
    }

    let stats = service.handle().stats().await.unwrap();
    assert_eq!(stats.disk.entries, viewport(1).len());
    service.shutdown();

    assert_eq!(tile_files(&dir).len(), viewport(1).len());
}

/// A configuration file sizes the tiers.
#[test]
fn test_config_file_drives_tiers() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.ini");
    let tiles_dir = dir.path().join("tiles");
    fs::write(
        &config_path,
        format!(
            "[cache]\n\
             directory = {}\n\
             disk_size = 2\n\
             disk_cost_strategy = unitary\n\
             memory_size = 64KB\n",
            tiles_dir.display()
        ),
    )
    .unwrap();

    let config = ConfigFile::load_from(&config_path)
        .unwrap()
        .to_tile_cache_config();
    let mut cache = TileCacheManager::open(config);

    assert_eq!(cache.directory(), tiles_dir.as_path());
    assert_eq!(cache.max_disk_usage(), 2);
    assert_eq!(cache.max_memory_usage(), 64 * 1024);
    assert_eq!(cache.cost_strategy_disk(), CostStrategy::Unitary);

    for spec in viewport(1).iter().take(3) {
        cache.insert(spec, png_tile(8, 1), "png", CacheAreas::DISK);
    }
    assert_eq!(cache.disk_specs().len(), 2);
}
