//! Packet codec vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use loco_core::protocol::packet::{decode_header, decode_packet, HEADER_LEN};

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn packet_vectors() {
    let files = [
        "packet_ping_empty_body.json",
        "packet_login_negative_status.json",
        "packet_zero_length_body.json",
        "packet_too_short.json",
        "packet_declared_length_exceeds.json",
        "packet_trailing_bytes.json",
        "packet_document_length_mismatch.json",
    ];

    for f in files {
        let v = load(f);
        let raw = v.frame.decode();
        let res = decode_packet(&raw);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let packet = res.expect("expected ok packet");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(packet.id as u64, ex["id"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(packet.status as i64, ex["status"].as_i64().unwrap(), "vector={}", v.description);
        assert_eq!(packet.method, ex["method"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(packet.body_type as u64, ex["body_type"].as_u64().unwrap(), "vector={}", v.description);

        let keys: Vec<&str> = packet.body.keys().map(String::as_str).collect();
        let expected_keys: Vec<&str> = ex["body_keys"]
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k.as_str().unwrap())
            .collect();
        assert_eq!(keys, expected_keys, "vector={}", v.description);

        let header = decode_header(&raw[..HEADER_LEN]).unwrap();
        assert_eq!(header.body_length as u64, ex["body_length"].as_u64().unwrap(), "vector={}", v.description);
    }
}
