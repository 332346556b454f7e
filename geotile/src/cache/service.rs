//! Threaded front end for [`TileCacheManager`].
//!
//! The manager is single-owner and does blocking file I/O, so the service
//! moves it onto a dedicated worker thread. Callers hold a cloneable
//! [`TileCacheHandle`] and talk to the worker over a channel, receiving
//! replies on a oneshot.
//!
//! ```text
//!  TileCacheHandle ──┐
//!  TileCacheHandle ──┼──► mpsc ──► worker thread ──► TileCacheManager
//!  TileCacheHandle ──┘                  │
//!        ▲                              │
//!        └──────────── oneshot ◄────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use geotile::cache::{CacheAreas, TileCacheConfig, TileCacheService};
//!
//! let service = TileCacheService::start(TileCacheConfig::new("/tmp/tiles"))?;
//! let cache = service.handle();
//!
//! cache.insert(spec.clone(), png, "png", CacheAreas::ALL).await?;
//! let texture = cache.get(spec).await?;
//!
//! service.shutdown();
//! ```

use std::sync::Arc;
use std::thread::JoinHandle;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use super::config::TileCacheConfig;
use super::entry::TextureTileEntry;
use super::error::TileCacheError;
use super::manager::TileCacheManager;
use super::stats::TileCacheStats;
use super::types::CacheAreas;
use crate::tile::TileSpec;

/// Name of the worker thread.
pub const WORKER_THREAD_NAME: &str = "geotile-cache";

enum Command {
    Get {
        spec: TileSpec,
        reply: oneshot::Sender<Option<Arc<TextureTileEntry>>>,
    },
    Insert {
        spec: TileSpec,
        bytes: Bytes,
        format: String,
        areas: CacheAreas,
        reply: oneshot::Sender<CacheAreas>,
    },
    ClearAll {
        reply: oneshot::Sender<usize>,
    },
    ClearMapId {
        map_id: i32,
        reply: oneshot::Sender<usize>,
    },
    Stats {
        reply: oneshot::Sender<TileCacheStats>,
    },
    Shutdown,
}

/// Owns the cache worker thread.
///
/// Dropping the service shuts the worker down like [`shutdown`](Self::shutdown).
pub struct TileCacheService {
    tx: mpsc::UnboundedSender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl TileCacheService {
    /// Spawn the worker thread and open the cache on it.
    ///
    /// Directory setup and the initial scan run on the worker; requests sent
    /// meanwhile queue behind them.
    pub fn start(config: TileCacheConfig) -> Result<Self, TileCacheError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(config, rx))
            .map_err(|e| TileCacheError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            tx,
            worker: Some(worker),
        })
    }

    /// A handle for sending requests to the worker.
    pub fn handle(&self) -> TileCacheHandle {
        TileCacheHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stop the worker and wait for it to close the cache.
    ///
    /// Requests already queued are served first. Blocks the calling thread
    /// until the worker exits.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        // The worker may already be gone if it panicked.
        let _ = self.tx.send(Command::Shutdown);
        if worker.join().is_err() {
            error!("Tile cache worker panicked");
        }
    }
}

impl Drop for TileCacheService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Cloneable client of a [`TileCacheService`].
#[derive(Clone)]
pub struct TileCacheHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl TileCacheHandle {
    /// Look a tile up, promoting it through the tiers.
    pub async fn get(&self, spec: TileSpec) -> Result<Option<Arc<TextureTileEntry>>, TileCacheError> {
        self.request(|reply| Command::Get { spec, reply }).await
    }

    /// Store a fetched tile; returns the tiers that accepted it.
    pub async fn insert(
        &self,
        spec: TileSpec,
        bytes: impl Into<Bytes>,
        format: impl Into<String>,
        areas: CacheAreas,
    ) -> Result<CacheAreas, TileCacheError> {
        let bytes = bytes.into();
        let format = format.into();
        self.request(|reply| Command::Insert {
            spec,
            bytes,
            format,
            areas,
            reply,
        })
        .await
    }

    /// Empty every tier and delete all tile files.
    pub async fn clear_all(&self) -> Result<usize, TileCacheError> {
        self.request(|reply| Command::ClearAll { reply }).await
    }

    /// Remove all tiles of `map_id`.
    pub async fn clear_map_id(&self, map_id: i32) -> Result<usize, TileCacheError> {
        self.request(|reply| Command::ClearMapId { map_id, reply })
            .await
    }

    pub async fn stats(&self) -> Result<TileCacheStats, TileCacheError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, TileCacheError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| TileCacheError::ShuttingDown)?;
        rx.await.map_err(|_| TileCacheError::ShuttingDown)
    }
}

fn run_worker(config: TileCacheConfig, mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut manager = TileCacheManager::open(config);
    info!(directory = %manager.directory().display(), "Tile cache worker started");

    // A dropped reply receiver means the caller gave up; nothing to do.
    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::Get { spec, reply } => {
                let _ = reply.send(manager.get(&spec));
            }
            Command::Insert {
                spec,
                bytes,
                format,
                areas,
                reply,
            } => {
                let _ = reply.send(manager.insert(&spec, bytes, &format, areas));
            }
            Command::ClearAll { reply } => {
                let _ = reply.send(manager.clear_all());
            }
            Command::ClearMapId { map_id, reply } => {
                let _ = reply.send(manager.clear_map_id(map_id));
            }
            Command::Stats { reply } => {
                let _ = reply.send(manager.stats());
            }
            Command::Shutdown => {
                debug!("Tile cache worker received shutdown");
                break;
            }
        }
    }

    rx.close();
    drop(manager);
    info!("Tile cache worker stopped");
}
