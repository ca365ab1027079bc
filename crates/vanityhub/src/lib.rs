//! Top-level facade crate for vanityhub.
//!
//! Re-exports the stats core and the server library so users can depend on a
//! single crate.

pub mod core {
    pub use vanityhub_core::*;
}

pub mod server {
    pub use vanityhub_server::*;
}
