//! Tile entries stored in the three cache tiers.
//!
//! Disk and memory entries hold a weak link back to the [`CacheOwner`] of
//! the manager that created them. The link is only used when an entry is
//! dropped:
//!
//! - a disk entry whose owner is still alive deletes its backing file;
//! - a disk entry that was detached (or outlived its manager) leaves the
//!   file alone so the next run can load it again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use image::RgbaImage;
use parking_lot::Mutex;
use tracing::debug;

use crate::tile::TileSpec;

/// Payload a fetcher stores for tiles that must never be retried.
pub const BOGUS_TILE_PAYLOAD: &[u8; 7] = b"NoRetry";

/// Whether `bytes` is exactly the non-retriable tile marker.
pub fn is_tile_bogus(bytes: &[u8]) -> bool {
    bytes == BOGUS_TILE_PAYLOAD
}

/// Bookkeeping shared between a manager and the entries it created.
///
/// Entries only hold a `Weak` to this; once the manager is gone, entry
/// drops become no-ops.
#[derive(Debug, Default)]
pub struct CacheOwner {
    files_deleted: AtomicU64,
    memory_bytes_released: AtomicU64,
}

impl CacheOwner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of tile files removed because their disk entry was evicted.
    pub fn files_deleted(&self) -> u64 {
        self.files_deleted.load(Ordering::Relaxed)
    }

    /// Payload bytes released by memory entries dropped while the owner lived.
    pub fn memory_bytes_released(&self) -> u64 {
        self.memory_bytes_released.load(Ordering::Relaxed)
    }

    fn evict_from_disk(&self, entry: &DiskTileEntry) {
        match fs::remove_file(&entry.filename) {
            Ok(()) => {
                self.files_deleted.fetch_add(1, Ordering::Relaxed);
                debug!(tile = %entry.spec, path = %entry.filename.display(), "Deleted evicted tile file");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                debug!(tile = %entry.spec, error = %e, "Failed to delete evicted tile file");
            }
        }
    }

    fn evict_from_memory(&self, entry: &MemoryTileEntry) {
        self.memory_bytes_released
            .fetch_add(entry.bytes.len() as u64, Ordering::Relaxed);
    }
}

/// A tile persisted as a file in the cache directory.
#[derive(Debug)]
pub struct DiskTileEntry {
    spec: TileSpec,
    filename: PathBuf,
    owner: Mutex<Option<Weak<CacheOwner>>>,
}

impl DiskTileEntry {
    pub fn new(spec: TileSpec, filename: PathBuf, owner: &Arc<CacheOwner>) -> Self {
        Self {
            spec,
            filename,
            owner: Mutex::new(Some(Arc::downgrade(owner))),
        }
    }

    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Image format, taken from the file extension.
    pub fn format(&self) -> &str {
        self.filename
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
    }

    /// Sever the link to the owner so dropping this entry keeps the file.
    pub fn detach(&self) {
        self.owner.lock().take();
    }
}

impl Drop for DiskTileEntry {
    fn drop(&mut self) {
        let owner = self.owner.get_mut().take().and_then(|weak| weak.upgrade());
        if let Some(owner) = owner {
            owner.evict_from_disk(self);
        }
    }
}

/// Encoded tile bytes held in RAM.
#[derive(Debug)]
pub struct MemoryTileEntry {
    spec: TileSpec,
    bytes: Bytes,
    format: String,
    owner: Option<Weak<CacheOwner>>,
}

impl MemoryTileEntry {
    pub fn new(spec: TileSpec, bytes: Bytes, format: impl Into<String>, owner: &Arc<CacheOwner>) -> Self {
        Self {
            spec,
            bytes,
            format: format.into(),
            owner: Some(Arc::downgrade(owner)),
        }
    }

    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn format(&self) -> &str {
        &self.format
    }
}

impl Drop for MemoryTileEntry {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.take().and_then(|weak| weak.upgrade()) {
            owner.evict_from_memory(self);
        }
    }
}

/// A decoded tile image ready for upload.
///
/// Non-retriable tiles are represented by an empty (0×0) image.
#[derive(Debug, Clone)]
pub struct TextureTileEntry {
    spec: TileSpec,
    image: RgbaImage,
}

impl TextureTileEntry {
    pub fn new(spec: TileSpec, image: RgbaImage) -> Self {
        Self { spec, image }
    }

    /// The texture returned for a non-retriable tile.
    pub fn empty(spec: TileSpec) -> Self {
        Self::new(spec, RgbaImage::new(0, 0))
    }

    pub fn spec(&self) -> &TileSpec {
        &self.spec
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Size of the decoded pixels in bytes.
    pub fn byte_size(&self) -> u64 {
        self.image.as_raw().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec() -> TileSpec {
        TileSpec::unversioned("osm", 1, 3, 4, 5)
    }

    fn write_tile(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"tile").unwrap();
        path
    }

    #[test]
    fn test_bogus_detection_is_exact() {
        assert!(is_tile_bogus(b"NoRetry"));
        assert!(!is_tile_bogus(b"NoRetry\n"));
        assert!(!is_tile_bogus(b"noretry"));
        assert!(!is_tile_bogus(b"NoRetr"));
        assert!(!is_tile_bogus(b""));
    }

    #[test]
    fn test_attached_disk_entry_deletes_file_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(&dir, "osm-1-3-4-5.png");
        let owner = CacheOwner::new();

        let entry = DiskTileEntry::new(spec(), path.clone(), &owner);
        drop(entry);

        assert!(!path.exists());
        assert_eq!(owner.files_deleted(), 1);
    }

    #[test]
    fn test_detached_disk_entry_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(&dir, "osm-1-3-4-5.png");
        let owner = CacheOwner::new();

        let entry = DiskTileEntry::new(spec(), path.clone(), &owner);
        entry.detach();
        drop(entry);

        assert!(path.exists());
        assert_eq!(owner.files_deleted(), 0);
    }

    #[test]
    fn test_entry_outliving_owner_keeps_file() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(&dir, "osm-1-3-4-5.png");
        let owner = CacheOwner::new();

        let entry = DiskTileEntry::new(spec(), path.clone(), &owner);
        drop(owner);
        drop(entry);

        assert!(path.exists());
    }

    #[test]
    fn test_disk_entry_format_from_extension() {
        let owner = CacheOwner::new();
        let entry = DiskTileEntry::new(spec(), PathBuf::from("/cache/osm-1-3-4-5.jpg"), &owner);
        assert_eq!(entry.format(), "jpg");
        entry.detach();
    }

    #[test]
    fn test_memory_entry_reports_release() {
        let owner = CacheOwner::new();
        let entry = MemoryTileEntry::new(spec(), Bytes::from_static(b"12345"), "png", &owner);
        assert_eq!(entry.format(), "png");
        drop(entry);
        assert_eq!(owner.memory_bytes_released(), 5);
    }

    #[test]
    fn test_texture_entry_sizes() {
        let texture = TextureTileEntry::new(spec(), RgbaImage::new(4, 2));
        assert!(!texture.is_empty());
        assert_eq!(texture.byte_size(), 32);

        let empty = TextureTileEntry::empty(spec());
        assert!(empty.is_empty());
        assert_eq!(empty.byte_size(), 0);
    }
}
