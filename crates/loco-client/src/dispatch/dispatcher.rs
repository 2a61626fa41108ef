use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::FutureExt;

use loco_core::error::Result;
use loco_core::protocol::packet::Packet;

use crate::obs::ClientMetrics;

/// Handler for unsolicited server packets of one method.
#[async_trait]
pub trait PushHandler: Send + Sync {
    async fn handle(&self, packet: &Packet) -> Result<()>;
}

#[async_trait]
impl<F> PushHandler for F
where
    F: Fn(&Packet) -> Result<()> + Send + Sync,
{
    async fn handle(&self, packet: &Packet) -> Result<()> {
        (self)(packet)
    }
}

/// Registry of push handlers keyed by method, in registration order.
///
/// Only the session's receive task calls `dispatch`, so handlers never run concurrently
/// with each other.
pub struct PushDispatcher {
    handlers: DashMap<String, Vec<Arc<dyn PushHandler>>>,
    metrics: Arc<ClientMetrics>,
}

impl PushDispatcher {
    pub fn new(metrics: Arc<ClientMetrics>) -> Self {
        Self {
            handlers: DashMap::new(),
            metrics,
        }
    }

    pub fn register(&self, method: impl Into<String>, handler: Arc<dyn PushHandler>) {
        self.handlers.entry(method.into()).or_default().push(handler);
    }

    /// Run every handler for `packet.method` in order. Failures are logged and contained.
    pub async fn dispatch(&self, packet: &Packet) {
        let method = packet.method.as_str();
        self.metrics.pushes.inc(&[("method", method)]);

        // Clone out so no shard lock is held across handler awaits.
        let handlers = match self.handlers.get(method) {
            Some(list) => list.value().clone(),
            None => {
                tracing::debug!(method, id = packet.id, "unmatched packet without push handler dropped");
                return;
            }
        };

        for (idx, handler) in handlers.iter().enumerate() {
            match AssertUnwindSafe(handler.handle(packet)).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.metrics.push_failures.inc(&[("method", method)]);
                    tracing::warn!(method, handler = idx, error = %e, "push handler failed");
                }
                Err(_) => {
                    self.metrics.push_failures.inc(&[("method", method)]);
                    tracing::warn!(method, handler = idx, "push handler panicked");
                }
            }
        }
    }
}
