//! vanityhub core: the statistics subsystem.
//!
//! This crate holds the two cooperating halves of the stats pipeline: the
//! in-memory [`stats::StatsStore`] (lock-free concurrent counters) and the
//! [`persist`] module (pluggable backing stores plus the periodic
//! synchronizer that flushes changed counters to disk). It carries no HTTP
//! dependencies so it can be reused outside the server binary.
//!
//! `unwrap`/`expect` are compile-denied here; fallible paths surface as
//! [`HubError`]/[`Result`]. The one deliberate exception is incrementing a
//! counter for an import path that was never seeded: that is a caller
//! contract violation and panics rather than corrupting the sum invariant.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod error;
pub mod persist;
pub mod stats;

/// Shared result type.
pub use error::{HubError, Result};
