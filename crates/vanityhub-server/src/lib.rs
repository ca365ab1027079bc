//! vanityhub server library entry.
//!
//! This crate wires the stats core into an HTTP surface: TOML config, one
//! route per configured package serving `go-import`/`go-source` meta pages,
//! and a basic-auth-protected Prometheus exposition endpoint. It is consumed
//! by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod pages;
pub mod router;
