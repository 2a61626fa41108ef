use std::sync::Arc;

use bson::{doc, Bson, Document};
use tokio::time::timeout;

use loco_core::error::{LocoError, Result};
use loco_core::model::{doc_i64, doc_string};
use loco_core::protocol::packet::{Packet, PacketIds};
use loco_core::protocol::{METHOD_CHECKIN, METHOD_GETCONF};

use crate::config::ClientConfig;
use crate::negotiate::Probe;
use crate::obs::ClientMetrics;
use crate::transport::TransportMode;

/// Checkin candidates from the booking reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfig {
    pub hosts: Vec<String>,
    pub ports: Vec<u16>,
}

impl BookingConfig {
    /// Hosts from `ticket.lsl`, ports from `wifi.ports` (falling back to `default_ports`).
    pub fn from_reply(body: &Document, default_ports: &[u16]) -> Self {
        let hosts = body
            .get_document("ticket")
            .ok()
            .and_then(|t| t.get_array("lsl").ok())
            .map(|lsl| {
                lsl.iter()
                    .filter_map(Bson::as_str)
                    .filter(|h| !h.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let ports: Vec<u16> = body
            .get_document("wifi")
            .ok()
            .and_then(|w| w.get_array("ports").ok())
            .map(|ports| ports.iter().filter_map(bson_port).collect())
            .unwrap_or_default();

        Self {
            hosts,
            ports: if ports.is_empty() { default_ports.to_vec() } else { ports },
        }
    }
}

fn bson_port(v: &Bson) -> Option<u16> {
    match v {
        Bson::Int32(p) => u16::try_from(*p).ok(),
        Bson::Int64(p) => u16::try_from(*p).ok(),
        _ => None,
    }
}

/// The chat server checkin assigned, and the transport variant that reached checkin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub host: String,
    pub port: u16,
    pub mode: TransportMode,
    /// Port of the checkin attempt that succeeded.
    pub checkin_port: u16,
}

pub struct Negotiator {
    cfg: Arc<ClientConfig>,
    probe: Arc<dyn Probe>,
    metrics: Arc<ClientMetrics>,
}

impl Negotiator {
    pub fn new(cfg: Arc<ClientConfig>, probe: Arc<dyn Probe>, metrics: Arc<ClientMetrics>) -> Self {
        Self { cfg, probe, metrics }
    }

    /// `GETCONF` against the booking host over TLS, bounded like one checkin attempt.
    pub async fn booking(&self) -> Result<BookingConfig> {
        let booking = &self.cfg.booking;
        let dev = &self.cfg.device;
        let request = Packet::request(
            PacketIds::new().next_id(),
            METHOD_GETCONF,
            Some(doc! {
                "MCCMNC": dev.mccmnc.as_str(),
                "os": dev.os.as_str(),
                "model": dev.model.as_str(),
            }),
        );

        let limit = self.cfg.checkin.attempt_timeout();
        let reply = timeout(
            limit,
            self.probe
                .round_trip(&booking.host, booking.port, TransportMode::Tls, &request),
        )
        .await
        .map_err(|_| LocoError::Timeout {
            method: METHOD_GETCONF.to_string(),
            id: request.id,
            after: limit,
        })??;

        let config = BookingConfig::from_reply(&reply.body, &self.cfg.checkin.default_ports);
        tracing::info!(
            status = ?doc_i64(&reply.body, "status"),
            hosts = config.hosts.len(),
            ports = ?config.ports,
            "booking complete"
        );
        Ok(config)
    }

    /// `CHECKIN`, probing each configured (mode, port) step in order.
    pub async fn checkin(&self, host: &str, candidate_port: u16, user_id: i64) -> Result<Assignment> {
        let dev = &self.cfg.device;
        let request = Packet::request(
            PacketIds::new().next_id(),
            METHOD_CHECKIN,
            Some(doc! {
                "userId": user_id,
                "os": dev.os.as_str(),
                "ntype": dev.ntype,
                "appVer": dev.checkin_app_version.as_str(),
                "MCCMNC": dev.mccmnc.as_str(),
                "lang": dev.lang.as_str(),
                "countryISO": dev.country_iso.as_str(),
                "useSub": true,
            }),
        );

        let per_attempt = self.cfg.checkin.attempt_timeout();
        let mut failures = Vec::with_capacity(self.cfg.checkin.probe.len());

        for step in &self.cfg.checkin.probe {
            let port = step.resolve_port(candidate_port);
            let attempt = timeout(
                per_attempt,
                self.probe.round_trip(host, port, step.mode, &request),
            )
            .await;

            let cause = match attempt {
                Ok(Ok(reply)) => {
                    let assigned = doc_string(&reply.body, "host");
                    if !assigned.is_empty() {
                        let assigned_port = doc_i64(&reply.body, "port")
                            .and_then(|p| u16::try_from(p).ok())
                            .unwrap_or(self.cfg.checkin.default_port);

                        self.metrics
                            .checkin_attempts
                            .inc(&[("mode", step.mode.as_str()), ("outcome", "ok")]);
                        tracing::info!(
                            host = %assigned,
                            port = assigned_port,
                            mode = %step.mode,
                            checkin_port = port,
                            "checkin assigned server"
                        );
                        return Ok(Assignment {
                            host: assigned,
                            port: assigned_port,
                            mode: step.mode,
                            checkin_port: port,
                        });
                    }
                    format!("reply without host (status={})", reply.status)
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!("timed out after {per_attempt:?}"),
            };

            self.metrics
                .checkin_attempts
                .inc(&[("mode", step.mode.as_str()), ("outcome", "failed")]);
            tracing::warn!(host, port, mode = %step.mode, cause = %cause, "checkin attempt failed");
            failures.push(format!("{}:{} {}", step.mode, port, cause));
        }

        Err(LocoError::Connection { attempts: failures })
    }
}
