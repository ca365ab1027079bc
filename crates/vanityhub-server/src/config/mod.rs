//! Server config loader (strict parsing).

pub mod schema;

use std::fs;

use vanityhub_core::error::{HubError, Result};

pub use schema::{PackageConfig, PrometheusSection, ServerConfig, StatsBackend, StatsSection};

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| HubError::Config(format!("read config {path}: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig =
        toml::from_str(s).map_err(|e| HubError::Config(format!("invalid toml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
