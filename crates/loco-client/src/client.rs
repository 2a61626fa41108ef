//! Bootstrap orchestration: booking, checkin, session open, login.
//!
//! `LocoClient` owns the shared pieces (config, connector, negotiator, push
//! dispatcher, metrics) and at most one current session. No automatic
//! reconnection: after a close the caller runs `full_connect` again.

use std::sync::Arc;

use loco_core::error::{LocoError, Result};
use loco_core::model::ChatRoom;

use crate::config::ClientConfig;
use crate::credentials::CredentialsProvider;
use crate::dispatch::{PushDispatcher, PushHandler};
use crate::negotiate::{Assignment, Negotiator, NetworkProbe, Probe};
use crate::obs::ClientMetrics;
use crate::session::{LoginOutcome, Session, SessionOptions, SessionState};
use crate::transport::{Connector, NetConnector};

/// A fully bootstrapped, authenticated session.
#[derive(Clone)]
pub struct Connected {
    pub session: Session,
    pub assignment: Assignment,
    pub user_id: i64,
    pub rooms: Vec<ChatRoom>,
}

pub struct LocoClient {
    cfg: Arc<ClientConfig>,
    credentials: Arc<dyn CredentialsProvider>,
    connector: Arc<dyn Connector>,
    negotiator: Negotiator,
    pushes: Arc<PushDispatcher>,
    metrics: Arc<ClientMetrics>,
    current: tokio::sync::Mutex<Option<Session>>,
}

impl LocoClient {
    /// Client over real sockets.
    pub fn new(cfg: ClientConfig, credentials: Arc<dyn CredentialsProvider>) -> Result<Self> {
        let connector: Arc<dyn Connector> = Arc::new(NetConnector::new());
        let probe: Arc<dyn Probe> = Arc::new(NetworkProbe::new(
            Arc::clone(&connector),
            cfg.session.max_frame_bytes,
        ));
        Self::with_transport(cfg, credentials, connector, probe)
    }

    /// Client over caller-supplied transports (in-memory streams, canned probes).
    pub fn with_transport(
        cfg: ClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
        connector: Arc<dyn Connector>,
        probe: Arc<dyn Probe>,
    ) -> Result<Self> {
        cfg.validate()?;
        let cfg = Arc::new(cfg);
        let metrics = Arc::new(ClientMetrics::default());
        let pushes = Arc::new(PushDispatcher::new(Arc::clone(&metrics)));
        let negotiator = Negotiator::new(Arc::clone(&cfg), probe, Arc::clone(&metrics));

        Ok(Self {
            cfg,
            credentials,
            connector,
            negotiator,
            pushes,
            metrics,
            current: tokio::sync::Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    pub fn metrics(&self) -> Arc<ClientMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    /// Register a push handler. Applies to the current session and every later one.
    pub fn on_push(&self, method: impl Into<String>, handler: Arc<dyn PushHandler>) {
        self.pushes.register(method, handler);
    }

    /// State of the current session (`Disconnected` when there is none).
    pub async fn state(&self) -> SessionState {
        match self.current.lock().await.as_ref() {
            Some(s) => s.state(),
            None => SessionState::Disconnected,
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.current.lock().await.clone()
    }

    /// Booking, checkin (with fallback probing), session open, login.
    ///
    /// Stops at the first hard failure: no booking hosts (`Discovery`), every checkin
    /// variant failed (`Connection`), connect failed (`Transport`), or login came back
    /// without a user id (`AuthFailed`). A previous session is disconnected first.
    ///
    /// `current` is only locked to swap sessions, never across network round trips.
    pub async fn full_connect(&self) -> Result<Connected> {
        let creds = self.credentials.credentials()?;
        let previous = self.current.lock().await.take();
        if let Some(old) = previous {
            old.disconnect().await;
        }

        let booking = self.negotiator.booking().await?;
        let host = booking
            .hosts
            .first()
            .cloned()
            .ok_or_else(|| LocoError::Discovery("booking returned no checkin hosts".into()))?;
        let candidate_port = booking
            .ports
            .first()
            .copied()
            .unwrap_or(self.cfg.checkin.default_port);

        let assignment = self
            .negotiator
            .checkin(&host, candidate_port, creds.user_id)
            .await?;

        let opts = SessionOptions {
            request_timeout: self.cfg.session.request_timeout(),
            max_frame_bytes: self.cfg.session.max_frame_bytes,
            pushes: Arc::clone(&self.pushes),
            metrics: Arc::clone(&self.metrics),
        };
        let session = Session::connect(
            self.connector.as_ref(),
            &assignment.host,
            assignment.port,
            assignment.mode,
            opts,
        )
        .await?;

        let outcome = match session.login(&creds, &self.cfg.device).await {
            Ok(outcome) => outcome,
            Err(e) => {
                session.disconnect().await;
                return Err(e);
            }
        };

        match outcome {
            LoginOutcome::Authenticated { user_id, rooms } => {
                tracing::info!(
                    user_id,
                    host = %assignment.host,
                    port = assignment.port,
                    mode = %assignment.mode,
                    "connected"
                );
                let replaced = self.current.lock().await.replace(session.clone());
                if let Some(old) = replaced {
                    old.disconnect().await;
                }
                Ok(Connected {
                    session,
                    assignment,
                    user_id,
                    rooms,
                })
            }
            LoginOutcome::Unauthenticated { status } => {
                session.disconnect().await;
                Err(LocoError::AuthFailed { status })
            }
        }
    }

    /// Close the current session, if any. Idempotent.
    pub async fn disconnect(&self) {
        if let Some(session) = self.current.lock().await.take() {
            session.disconnect().await;
        }
    }
}
