//! Metrics exposition for the stats subsystem.
//!
//! The counters already live as atomics in the core store, so the `/-/metrics`
//! handler renders Prometheus text format straight from it; no separate
//! metrics registry to keep in sync.

pub mod auth;
pub mod metrics;
