#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use loco_client::config::{self, ClientConfig};
use loco_client::transport::TransportMode;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
checkin:
  attempt_timeot_ms: 5000 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.booking.host, "booking-loco.kakao.com");
    assert_eq!(cfg.booking.port, 443);
    assert_eq!(cfg.checkin.default_port, 5223);
    assert_eq!(cfg.checkin.attempt_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.session.request_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.device.os, "mac");
}

#[test]
fn default_probe_order_is_tls443_tls_candidate_legacy_candidate() {
    let cfg = ClientConfig::default();
    let steps: Vec<(TransportMode, u16)> = cfg
        .checkin
        .probe
        .iter()
        .map(|s| (s.mode, s.resolve_port(5228)))
        .collect();

    assert_eq!(
        steps,
        vec![
            (TransportMode::Tls, 443),
            (TransportMode::Tls, 5228),
            (TransportMode::Legacy, 5228),
        ]
    );
    cfg.validate().expect("defaults validate");
}

#[test]
fn probe_order_is_configuration() {
    let yaml = r#"
version: 1
checkin:
  probe:
    - { mode: legacy }
    - { mode: tls, port: 8443 }
"#;
    let cfg = config::load_from_str(yaml).expect("must parse");
    assert_eq!(cfg.checkin.probe.len(), 2);
    assert_eq!(cfg.checkin.probe[0].mode, TransportMode::Legacy);
    assert_eq!(cfg.checkin.probe[0].resolve_port(9282), 9282);
    assert_eq!(cfg.checkin.probe[1].resolve_port(9282), 8443);
}

#[test]
fn rejects_unknown_transport_mode() {
    let yaml = r#"
version: 1
checkin:
  probe:
    - { mode: quic }
"#;
    let err = config::load_from_str(yaml).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn rejects_empty_probe_list() {
    let yaml = r#"
version: 1
checkin:
  probe: []
"#;
    let err = config::load_from_str(yaml).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}

#[test]
fn rejects_out_of_range_timeouts() {
    let yaml = r#"
version: 1
session:
  request_timeout_ms: 10
"#;
    assert_eq!(
        config::load_from_str(yaml).expect_err("must fail").code().as_str(),
        "CONFIG"
    );

    let yaml = r#"
version: 1
checkin:
  attempt_timeout_ms: 120000
"#;
    assert_eq!(
        config::load_from_str(yaml).expect_err("must fail").code().as_str(),
        "CONFIG"
    );
}

#[test]
fn rejects_unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIG");
}
