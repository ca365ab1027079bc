use std::collections::HashSet;

use serde::Deserialize;
use vanityhub_core::error::{HubError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,

    #[serde(default)]
    pub stats: StatsSection,

    #[serde(default)]
    pub packages: Vec<PackageConfig>,

    #[serde(default)]
    pub prometheus: PrometheusSection,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.packages.is_empty() {
            return Err(HubError::Config("packages must not be empty".into()));
        }

        let mut subpaths = HashSet::new();
        for pkg in &self.packages {
            if pkg.import_path.is_empty() {
                return Err(HubError::Config("package import_path must not be empty".into()));
            }
            if pkg.repo.is_empty() {
                return Err(HubError::Config(format!(
                    "package {} has an empty repo",
                    pkg.import_path
                )));
            }
            if !pkg.subpath.starts_with('/') {
                return Err(HubError::Config(format!(
                    "package {} subpath must start with '/'",
                    pkg.import_path
                )));
            }
            if !subpaths.insert(pkg.subpath.as_str()) {
                return Err(HubError::Config(format!(
                    "duplicate package subpath: {}",
                    pkg.subpath
                )));
            }
        }

        self.stats.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsSection {
    #[serde(default)]
    pub backend: StatsBackend,

    /// JSON file path, or sled directory when `backend = "sled"`.
    #[serde(default = "default_stats_path")]
    pub path: String,

    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
}

impl StatsSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(HubError::Config("stats.path must not be empty".into()));
        }
        if self.sync_interval_secs == 0 {
            return Err(HubError::Config("stats.sync_interval_secs must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for StatsSection {
    fn default() -> Self {
        Self {
            backend: StatsBackend::default(),
            path: default_stats_path(),
            sync_interval_secs: default_sync_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsBackend {
    #[default]
    Json,
    Sled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    pub import_path: String,
    pub subpath: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

/// Basic auth for the metrics endpoint. Both fields empty means the endpoint
/// is open.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusSection {
    #[serde(default)]
    pub auth_username: String,
    #[serde(default)]
    pub auth_password: String,
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_stats_path() -> String {
    "./stats.json".to_string()
}

fn default_sync_interval_secs() -> u64 {
    60
}

fn default_branch() -> String {
    "main".to_string()
}
