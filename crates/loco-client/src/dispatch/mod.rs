//! Dispatcher module exports.
//!
//! Re-exports the push dispatcher and handler trait so downstream consumers can
//! depend on this module directly.

pub mod dispatcher;

pub use dispatcher::{PushDispatcher, PushHandler};
