//! Booking (discovery) and checkin (server assignment).
//!
//! Checkin walks `checkin.probe` in order, one round trip per step, until a
//! reply names a host. The order lives in configuration, not in control flow.

pub mod negotiator;
pub mod probe;

pub use negotiator::{Assignment, BookingConfig, Negotiator};
pub use probe::{NetworkProbe, Probe};
