//! Embedded KV backing store (sled).
//!
//! Flat key scheme: totals under `view_total` / `get_total`, per-package
//! counters under `view_<import path>` / `get_<import path>`, values as
//! decimal ASCII. The import path is embedded verbatim, so a package
//! literally named `total` would collide with the total keys; that edge is
//! known and unhandled.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

use super::{StatsBacking, StatsSnapshot};

const KEY_TOTAL_VIEW: &str = "view_total";
const KEY_TOTAL_GET: &str = "get_total";
const PREFIX_VIEW: &str = "view_";
const PREFIX_GET: &str = "get_";

pub struct SledBacking {
    db: sled::Db,
}

impl SledBacking {
    pub fn new(db: sled::Db) -> Self {
        Self { db }
    }

    /// Open (or create) a sled database at the given directory path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self::new(db))
    }
}

fn parse_count(value: &[u8]) -> Option<i64> {
    std::str::from_utf8(value).ok()?.parse().ok()
}

#[async_trait]
impl StatsBacking for SledBacking {
    async fn load(&self) -> Result<Option<StatsSnapshot>> {
        if self.db.is_empty() {
            return Ok(None);
        }

        let mut snapshot = StatsSnapshot {
            total_view: 0,
            total_get: 0,
            pkgs_view: Default::default(),
            pkgs_get: Default::default(),
        };

        for item in self.db.iter() {
            let (key, value) = item?;
            let Ok(key) = std::str::from_utf8(&key) else {
                continue;
            };
            // Unknown or malformed entries are skipped, not fatal.
            let Some(count) = parse_count(&value) else {
                continue;
            };
            if key == KEY_TOTAL_VIEW {
                snapshot.total_view = count;
            } else if key == KEY_TOTAL_GET {
                snapshot.total_get = count;
            } else if let Some(path) = key.strip_prefix(PREFIX_VIEW) {
                snapshot.pkgs_view.insert(path.to_owned(), count);
            } else if let Some(path) = key.strip_prefix(PREFIX_GET) {
                snapshot.pkgs_get.insert(path.to_owned(), count);
            }
        }

        Ok(Some(snapshot))
    }

    async fn store(&self, snapshot: &StatsSnapshot) -> Result<()> {
        let mut batch = sled::Batch::default();
        batch.insert(KEY_TOTAL_VIEW, snapshot.total_view.to_string().as_bytes());
        batch.insert(KEY_TOTAL_GET, snapshot.total_get.to_string().as_bytes());
        for (path, count) in &snapshot.pkgs_view {
            batch.insert(
                format!("{PREFIX_VIEW}{path}").as_bytes(),
                count.to_string().as_bytes(),
            );
        }
        for (path, count) in &snapshot.pkgs_get {
            batch.insert(
                format!("{PREFIX_GET}{path}").as_bytes(),
                count.to_string().as_bytes(),
            );
        }

        self.db.apply_batch(batch)?;
        self.db.flush_async().await?;
        Ok(())
    }
}
