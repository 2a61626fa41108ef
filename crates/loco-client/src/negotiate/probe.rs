use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use loco_core::error::Result;
use loco_core::protocol::packet::Packet;

use crate::transport::{read_packet, write_frame, Connector, Framing, TransportMode};

/// One connection, one request, one reply.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn round_trip(
        &self,
        host: &str,
        port: u16,
        mode: TransportMode,
        request: &Packet,
    ) -> Result<Packet>;
}

/// Probe over real sockets (fresh key per attempt in legacy mode).
pub struct NetworkProbe {
    connector: Arc<dyn Connector>,
    max_frame_bytes: usize,
}

impl NetworkProbe {
    pub fn new(connector: Arc<dyn Connector>, max_frame_bytes: usize) -> Self {
        Self {
            connector,
            max_frame_bytes,
        }
    }
}

#[async_trait]
impl Probe for NetworkProbe {
    async fn round_trip(
        &self,
        host: &str,
        port: u16,
        mode: TransportMode,
        request: &Packet,
    ) -> Result<Packet> {
        let mut stream = self.connector.connect(host, port, mode).await?;
        let framing = Framing::for_mode(mode);

        if let Some(handshake) = framing.handshake()? {
            write_frame(&mut stream, &handshake).await?;
        }
        write_frame(&mut stream, &framing.seal(request)?).await?;

        let reply = read_packet(&mut stream, &framing, self.max_frame_bytes).await?;
        let _ = stream.shutdown().await;
        Ok(reply)
    }
}
