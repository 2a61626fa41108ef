//! LOCO core: transport-agnostic protocol primitives, error types, and record views.
//!
//! This crate defines the wire-level contracts (packet codec, legacy secure
//! channel) and the error surface shared by the client engine and its tests.
//! It intentionally carries no async runtime so it can be reused in multiple
//! contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `LocoError`/`Result` so a malformed
//! frame from the server never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, LocoError, Result};
