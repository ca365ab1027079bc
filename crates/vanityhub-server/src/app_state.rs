//! Shared application state for the vanityhub server.

use std::sync::Arc;

use vanityhub_core::stats::StatsStore;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ServerConfig,
    stats: Arc<StatsStore>,
}

impl AppState {
    /// Build application state. `stats` must already be seeded with every
    /// configured import path; the page handlers increment without checking.
    pub fn new(cfg: ServerConfig, stats: Arc<StatsStore>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, stats }),
        }
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn stats(&self) -> &StatsStore {
        &self.inner.stats
    }
}
