//! Network connector: TLS via rustls (webpki roots), legacy via plain TCP.

use std::sync::Arc;

use async_trait::async_trait;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig as TlsConfig, RootCertStore};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use loco_core::error::{LocoError, Result};

use crate::transport::{BoxStream, Connector, TransportMode};

#[derive(Clone)]
pub struct NetConnector {
    tls: TlsConnector,
}

impl NetConnector {
    pub fn new() -> Self {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let cfg = TlsConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        Self {
            tls: TlsConnector::from(Arc::new(cfg)),
        }
    }
}

impl Default for NetConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for NetConnector {
    async fn connect(&self, host: &str, port: u16, mode: TransportMode) -> Result<BoxStream> {
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| LocoError::Transport(format!("connect {host}:{port} failed: {e}")))?;
        if let Err(e) = tcp.set_nodelay(true) {
            tracing::debug!(host, port, error = %e, "set_nodelay failed");
        }

        match mode {
            TransportMode::Legacy => Ok(Box::new(tcp)),
            TransportMode::Tls => {
                let name = ServerName::try_from(host.to_string())
                    .map_err(|e| LocoError::Transport(format!("invalid tls name {host}: {e}")))?;
                let stream = self
                    .tls
                    .connect(name, tcp)
                    .await
                    .map_err(|e| LocoError::Transport(format!("tls {host}:{port} failed: {e}")))?;
                Ok(Box::new(stream))
            }
        }
    }
}
