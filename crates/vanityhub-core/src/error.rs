//! Shared error type across vanityhub crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, HubError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("config error: {0}")]
    Config(String),
    #[error("backing store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("backing store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("backing store: {0}")]
    Backing(String),
}

impl From<sled::Error> for HubError {
    fn from(e: sled::Error) -> Self {
        HubError::Backing(e.to_string())
    }
}
