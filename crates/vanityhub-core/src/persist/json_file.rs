//! JSON-file backing store.
//!
//! The whole snapshot is one pretty-printed JSON document. Writes go to a
//! sibling `.tmp` file first and are renamed into place, so a crash mid-write
//! leaves the previous snapshot intact rather than a truncated file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

use super::{StatsBacking, StatsSnapshot};

pub struct JsonFileBacking {
    path: PathBuf,
}

impl JsonFileBacking {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.clone().into_os_string();
        p.push(".tmp");
        PathBuf::from(p)
    }
}

#[async_trait]
impl StatsBacking for JsonFileBacking {
    async fn load(&self) -> Result<Option<StatsSnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            // No file yet: fresh start, not an error.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: StatsSnapshot = serde_json::from_slice(&bytes)?;
        Ok(Some(snapshot))
    }

    async fn store(&self, snapshot: &StatsSnapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
