//! Persistence synchronizer: bridges the volatile [`StatsStore`] and a
//! durable backing store.
//!
//! Two interchangeable backings implement [`StatsBacking`]: a single JSON
//! file ([`json_file::JsonFileBacking`]) and an embedded sled tree
//! ([`sled_store::SledBacking`]). Both persist the same logical shape,
//! [`StatsSnapshot`].
//!
//! The synchronizer flushes on a fixed tick and once more on shutdown,
//! skipping the write entirely when nothing changed since the last
//! successful flush.

pub mod json_file;
pub mod sled_store;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::Result;
use crate::stats::StatsStore;

/// Point-in-time copy of every counter, in the shape that gets persisted.
/// BTreeMaps keep the serialized form deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_view: i64,
    pub total_get: i64,
    pub pkgs_view: BTreeMap<String, i64>,
    pub pkgs_get: BTreeMap<String, i64>,
}

impl StatsSnapshot {
    /// Copy current counter values out of a live store. Concurrent
    /// increments during the copy are fine; they re-dirty the store and are
    /// flushed next tick.
    pub fn capture(stats: &StatsStore) -> Self {
        let mut pkgs_view = BTreeMap::new();
        let mut pkgs_get = BTreeMap::new();
        for path in stats.import_paths() {
            pkgs_view.insert(path.to_owned(), stats.pkg_view(path));
            pkgs_get.insert(path.to_owned(), stats.pkg_get(path));
        }
        Self {
            total_view: stats.total_view(),
            total_get: stats.total_get(),
            pkgs_view,
            pkgs_get,
        }
    }
}

/// Durable storage behind the synchronizer. `load` returns `Ok(None)` when
/// the backing store is empty or absent; that is a fresh start, not an
/// error. `store` must be atomic under the backing's own guarantees (rename
/// for the file variant, a batch for sled).
#[async_trait]
pub trait StatsBacking: Send + Sync {
    async fn load(&self) -> Result<Option<StatsSnapshot>>;
    async fn store(&self, snapshot: &StatsSnapshot) -> Result<()>;
}

/// Reconstruct a [`StatsStore`] from whatever the backing store holds.
///
/// Decode failures are returned as errors; the caller treats them as fatal
/// at startup since running with unknown state is worse than not running.
/// An empty backing yields a zeroed store. Paths loaded here are retained
/// even if no longer configured, so their history keeps being persisted.
pub async fn load_stats(backing: &dyn StatsBacking) -> Result<StatsStore> {
    match backing.load().await? {
        Some(snap) => Ok(StatsStore::from_counts(
            snap.total_view,
            snap.total_get,
            snap.pkgs_view,
            snap.pkgs_get,
        )),
        None => Ok(StatsStore::new()),
    }
}

/// Periodic, change-aware flusher.
pub struct Synchronizer {
    stats: Arc<StatsStore>,
    backing: Arc<dyn StatsBacking>,
    interval: Duration,
}

impl Synchronizer {
    pub fn new(stats: Arc<StatsStore>, backing: Arc<dyn StatsBacking>, interval: Duration) -> Self {
        Self {
            stats,
            backing,
            interval,
        }
    }

    /// Flush the store if it is dirty. Returns `Ok(false)` when the backing
    /// store was already up to date and no write happened.
    ///
    /// The `last_updated` version is read *before* the snapshot is taken and
    /// is what gets recorded as synced on success; an increment racing the
    /// write bumps the version again and stays dirty. On failure
    /// `last_synced` is left untouched so the next tick retries.
    pub async fn flush(&self) -> Result<bool> {
        let synced = self.stats.last_synced();
        let updated = self.stats.last_updated();
        if synced == updated {
            tracing::trace!("stats flush skipped: backing store is up to date");
            return Ok(false);
        }

        let snapshot = StatsSnapshot::capture(&self.stats);
        self.backing.store(&snapshot).await?;
        self.stats.mark_synced(updated);
        tracing::debug!(
            total_view = snapshot.total_view,
            total_get = snapshot.total_get,
            "stats flushed"
        );
        Ok(true)
    }

    /// Run the flush loop until `shutdown` flips, then flush one final time
    /// and return. The driver must await this task before releasing the
    /// backing store; that ordering is what guarantees increments recorded
    /// before shutdown survive.
    ///
    /// Per-tick flush errors are logged and retried on the next tick; there
    /// is no backoff and no retry cap.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.interval);
        // The first interval tick fires immediately; skip it, there is
        // nothing to flush yet.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(e) = self.flush().await {
                        tracing::error!(error = %e, "stats flush failed, will retry next tick");
                    }
                }
                _ = shutdown.changed() => {
                    if let Err(e) = self.flush().await {
                        tracing::error!(error = %e, "final stats flush failed, recent counts lost");
                    }
                    tracing::info!("stats synchronizer stopped");
                    return;
                }
            }
        }
    }
}
