//! loco-client
//!
//! Bootstraps one session (booking, checkin, login), logs incoming chat
//! messages until Ctrl-C, then disconnects.
//! - Config: `$LOCO_CONFIG` (default `loco.yaml`; built-in defaults if absent)
//! - Credentials: `$LOCO_CREDENTIALS` (default `credentials.json`)

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use loco_client::config::{self, ClientConfig};
use loco_client::credentials::JsonFileCredentials;
use loco_client::LocoClient;
use loco_core::model::{doc_i64, ChatMessage};
use loco_core::protocol::packet::Packet;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(code = e.code().as_str(), error = %e, "loco-client failed");
        std::process::exit(1);
    }
}

async fn run() -> loco_core::Result<()> {
    let cfg_path = std::env::var("LOCO_CONFIG").unwrap_or_else(|_| "loco.yaml".into());
    let cfg = if Path::new(&cfg_path).exists() {
        config::load_from_file(&cfg_path)?
    } else {
        tracing::info!(path = %cfg_path, "config file not found, using defaults");
        ClientConfig::default()
    };

    let creds_path =
        std::env::var("LOCO_CREDENTIALS").unwrap_or_else(|_| "credentials.json".into());
    let client = LocoClient::new(cfg, Arc::new(JsonFileCredentials::new(creds_path)))?;

    client.on_push(
        "MSG",
        Arc::new(|p: &Packet| -> loco_core::Result<()> {
            let chat_id = doc_i64(&p.body, "chatId").unwrap_or_default();
            if let Ok(log) = p.body.get_document("chatLog") {
                let msg = ChatMessage::from_doc(log, chat_id);
                tracing::info!(
                    chat_id = msg.chat_id,
                    author = msg.author_id,
                    text = %msg.message,
                    "message"
                );
            }
            Ok(())
        }),
    );

    let connected = client.full_connect().await?;
    tracing::info!(
        user_id = connected.user_id,
        rooms = connected.rooms.len(),
        "listening for pushes (Ctrl-C to quit)"
    );

    let _ = tokio::signal::ctrl_c().await;
    client.disconnect().await;
    tracing::debug!(metrics = %client.metrics().render(), "final metrics");
    Ok(())
}
