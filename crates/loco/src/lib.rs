//! Top-level facade crate for the LOCO client.
//!
//! Re-exports the core primitives and the async client so users can depend on a single crate.

pub mod core {
    pub use loco_core::*;
}

pub mod client {
    pub use loco_client::*;
}
