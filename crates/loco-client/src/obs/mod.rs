//! Lightweight in-process metrics.
//!
//! Counters, gauges and latency histograms stored as atomics and rendered in
//! Prometheus text format on demand via `ClientMetrics::render`.

pub mod metrics;

pub use metrics::ClientMetrics;
