//! Transport layer: stream connectors and per-mode frame I/O.
//!
//! Two transport generations are served concurrently by the remote side:
//! - `Tls`: raw packets over a TLS socket.
//! - `Legacy`: RSA handshake, then AES-CFB frames over plain TCP.

pub mod frame;
pub mod net;

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWrite};

use loco_core::error::Result;

pub use frame::{read_packet, write_frame, Framing};
pub use net::NetConnector;

/// Which framing the connection speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Tls,
    Legacy,
}

impl TransportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Tls => "tls",
            TransportMode::Legacy => "legacy",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any bidirectional byte stream a session can run on.
pub trait LocoStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> LocoStream for T {}

pub type BoxStream = Box<dyn LocoStream>;

/// Opens the byte stream for a mode. TLS wrapping happens here; LOCO framing does not.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str, port: u16, mode: TransportMode) -> Result<BoxStream>;
}
