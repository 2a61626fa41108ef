//! LOCO client engine.
//!
//! Wires the stream connectors, frame I/O, booking/checkin negotiation, the
//! multiplexed session and push dispatch into one client. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod client;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod negotiate;
pub mod obs;
pub mod session;
pub mod transport;

pub use client::{Connected, LocoClient};
