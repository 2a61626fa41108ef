//! Booking parsing and ordered checkin probing over a canned probe.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Document};

use loco_client::config::ClientConfig;
use loco_client::negotiate::{BookingConfig, Negotiator, Probe};
use loco_client::obs::ClientMetrics;
use loco_client::transport::TransportMode;
use loco_core::error::{LocoError, Result};
use loco_core::protocol::packet::{Packet, BODY_TYPE_BSON};

#[derive(Clone, Copy)]
enum Canned {
    Hang,
    Fail,
    Reply(fn() -> Document),
}

/// Answers each (mode, port) from a fixed table and records every attempt.
struct CannedProbe {
    table: Vec<((TransportMode, u16), Canned)>,
    calls: Mutex<Vec<(String, u16, TransportMode, Packet)>>,
}

impl CannedProbe {
    fn new(table: Vec<((TransportMode, u16), Canned)>) -> Arc<Self> {
        Arc::new(Self {
            table,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn attempts(&self) -> Vec<(TransportMode, u16)> {
        self.calls.lock().unwrap().iter().map(|c| (c.2, c.1)).collect()
    }
}

#[async_trait]
impl Probe for CannedProbe {
    async fn round_trip(
        &self,
        host: &str,
        port: u16,
        mode: TransportMode,
        request: &Packet,
    ) -> Result<Packet> {
        self.calls
            .lock()
            .unwrap()
            .push((host.to_string(), port, mode, request.clone()));

        let canned = self
            .table
            .iter()
            .find(|(k, _)| *k == (mode, port))
            .map(|(_, c)| *c)
            .unwrap_or(Canned::Fail);

        match canned {
            Canned::Hang => std::future::pending::<Result<Packet>>().await,
            Canned::Fail => Err(LocoError::Transport(format!("connection refused {host}:{port}"))),
            Canned::Reply(body) => Ok(Packet {
                id: request.id,
                status: 0,
                method: request.method.clone(),
                body_type: BODY_TYPE_BSON,
                body: body(),
            }),
        }
    }
}

fn negotiator(probe: Arc<CannedProbe>) -> (Negotiator, Arc<ClientMetrics>) {
    let metrics = Arc::new(ClientMetrics::default());
    let n = Negotiator::new(
        Arc::new(ClientConfig::default()),
        probe,
        Arc::clone(&metrics),
    );
    (n, metrics)
}

fn assigned() -> Document {
    doc! { "status": 0, "host": "chat-17.loco.example", "port": 9282 }
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_legacy_after_tls_timeout_and_error() {
    let probe = CannedProbe::new(vec![
        ((TransportMode::Tls, 443), Canned::Hang),
        ((TransportMode::Tls, 5228), Canned::Fail),
        ((TransportMode::Legacy, 5228), Canned::Reply(assigned)),
    ]);
    let (n, metrics) = negotiator(Arc::clone(&probe));

    let started = tokio::time::Instant::now();
    let a = n.checkin("ticket.loco.example", 5228, 4242).await.unwrap();

    assert_eq!(a.mode, TransportMode::Legacy);
    assert_eq!(a.host, "chat-17.loco.example");
    assert_eq!(a.port, 9282);
    assert_eq!(a.checkin_port, 5228);
    assert!(started.elapsed() >= Duration::from_secs(10));

    assert_eq!(
        probe.attempts(),
        vec![
            (TransportMode::Tls, 443),
            (TransportMode::Tls, 5228),
            (TransportMode::Legacy, 5228),
        ]
    );
    assert_eq!(
        metrics.checkin_attempts.get(&[("mode", "tls"), ("outcome", "failed")]),
        2
    );
    assert_eq!(
        metrics.checkin_attempts.get(&[("mode", "legacy"), ("outcome", "ok")]),
        1
    );
}

#[tokio::test]
async fn first_success_stops_probing() {
    let probe = CannedProbe::new(vec![((TransportMode::Tls, 443), Canned::Reply(assigned))]);
    let (n, _) = negotiator(Arc::clone(&probe));

    let a = n.checkin("ticket.loco.example", 5228, 1).await.unwrap();
    assert_eq!(a.mode, TransportMode::Tls);
    assert_eq!(a.checkin_port, 443);
    assert_eq!(probe.attempts().len(), 1);
}

#[tokio::test]
async fn checkin_request_carries_device_fields() {
    let probe = CannedProbe::new(vec![((TransportMode::Tls, 443), Canned::Reply(assigned))]);
    let (n, _) = negotiator(Arc::clone(&probe));
    n.checkin("ticket.loco.example", 5223, 4242).await.unwrap();

    let calls = probe.calls.lock().unwrap();
    let (host, _, _, req) = &calls[0];
    assert_eq!(host, "ticket.loco.example");
    assert_eq!(req.method, "CHECKIN");
    assert_eq!(req.body.get_i64("userId").unwrap(), 4242);
    assert_eq!(req.body.get_str("os").unwrap(), "mac");
    assert_eq!(req.body.get_str("appVer").unwrap(), "4.5.0");
    assert_eq!(req.body.get_str("countryISO").unwrap(), "KR");
    assert!(req.body.get_bool("useSub").unwrap());
}

#[tokio::test]
async fn reply_without_host_is_a_failed_attempt() {
    fn no_host() -> Document {
        doc! { "status": -500 }
    }
    fn no_port() -> Document {
        doc! { "host": "chat-2.loco.example" }
    }
    let probe = CannedProbe::new(vec![
        ((TransportMode::Tls, 443), Canned::Reply(no_host)),
        ((TransportMode::Tls, 5223), Canned::Reply(no_port)),
    ]);
    let (n, _) = negotiator(Arc::clone(&probe));

    let a = n.checkin("ticket.loco.example", 5223, 1).await.unwrap();
    assert_eq!(a.host, "chat-2.loco.example");
    assert_eq!(a.mode, TransportMode::Tls);
    assert_eq!(a.port, 5223, "falls back to the default port");
    assert_eq!(probe.attempts().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn exhausted_probes_aggregate_every_cause() {
    let probe = CannedProbe::new(vec![((TransportMode::Tls, 443), Canned::Hang)]);
    let (n, metrics) = negotiator(Arc::clone(&probe));

    let err = n.checkin("ticket.loco.example", 995, 1).await.unwrap_err();
    assert_eq!(err.code().as_str(), "CONNECTION");

    let LocoError::Connection { attempts } = err else {
        panic!("expected connection error");
    };
    assert_eq!(attempts.len(), 3);
    assert!(attempts[0].starts_with("tls:443 timed out"));
    assert!(attempts[1].starts_with("tls:995 "));
    assert!(attempts[1].contains("connection refused"));
    assert!(attempts[2].starts_with("legacy:995 "));
    assert_eq!(
        metrics.checkin_attempts.get(&[("mode", "legacy"), ("outcome", "failed")]),
        1
    );
}

#[tokio::test]
async fn booking_reads_hosts_and_ports() {
    fn conf() -> Document {
        doc! {
            "status": 0,
            "ticket": { "lsl": ["ticket-a.loco.example", "ticket-b.loco.example"] },
            "wifi": { "ports": [5228, 9282_i64] },
        }
    }
    let probe = CannedProbe::new(vec![((TransportMode::Tls, 443), Canned::Reply(conf))]);
    let (n, _) = negotiator(Arc::clone(&probe));

    let booking = n.booking().await.unwrap();
    assert_eq!(
        booking,
        BookingConfig {
            hosts: vec!["ticket-a.loco.example".into(), "ticket-b.loco.example".into()],
            ports: vec![5228, 9282],
        }
    );

    let calls = probe.calls.lock().unwrap();
    let (host, port, mode, req) = &calls[0];
    assert_eq!((host.as_str(), *port, *mode), ("booking-loco.kakao.com", 443, TransportMode::Tls));
    assert_eq!(req.method, "GETCONF");
    assert_eq!(req.body.get_str("MCCMNC").unwrap(), "99999");
}

#[test]
fn booking_without_ports_uses_defaults() {
    let body = doc! { "ticket": { "lsl": ["ticket-a.loco.example"] } };
    let cfg = BookingConfig::from_reply(&body, &[5223, 5228]);
    assert_eq!(cfg.hosts, vec!["ticket-a.loco.example".to_string()]);
    assert_eq!(cfg.ports, vec![5223, 5228]);

    let empty = BookingConfig::from_reply(&doc! {}, &[5223]);
    assert!(empty.hosts.is_empty());
    assert_eq!(empty.ports, vec![5223]);
}
