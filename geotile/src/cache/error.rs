//! Errors surfaced by the tile cache.
//!
//! Lookups and inserts never fail outwardly; these errors are logged and
//! turned into misses. They are returned only by the service layer and by
//! internal helpers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileCacheError {
    /// Tile payload is not a decodable image.
    #[error("Problem with tile image: {0}")]
    Decode(#[from] image::ImageError),

    /// The cache service is shutting down.
    #[error("Tile cache is shutting down")]
    ShuttingDown,

    /// Failed to spawn the cache worker thread.
    #[error("Failed to spawn cache worker: {0}")]
    WorkerSpawn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TileCacheError::ShuttingDown.to_string(),
            "Tile cache is shutting down"
        );
        let err = TileCacheError::WorkerSpawn("no threads".to_string());
        assert!(err.to_string().contains("no threads"));
    }
}
