//! Packet encode/decode behaviour.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bson::{doc, Bson, Document};

use loco_core::protocol::packet::{
    decode_header, decode_packet, encode_packet, Packet, PacketIds, HEADER_LEN, METHOD_LEN,
};

fn mixed_body() -> Document {
    doc! {
        "chatId": 18_000_000_000_i64,
        "count": 30,
        "msg": "안녕하세요 hello",
        "noSeen": false,
        "ratio": 0.5,
        "nested": { "ids": [1_i64, 2_i64, 3_i64], "empty": {} },
        "list": [ { "k": "v" }, "text", true ],
    }
}

#[test]
fn decode_inverts_encode() {
    let packets = [
        Packet::request(1, "LOGINLIST", Some(mixed_body())),
        Packet {
            id: u32::MAX,
            status: -950,
            method: "CHECKIN".into(),
            body_type: 0,
            body: doc! { "host": "10.0.0.1", "port": 5223 },
        },
        Packet::request(42, "ABCDEFGHIJK", None),
    ];

    for p in packets {
        let raw = encode_packet(&p).unwrap();
        assert_eq!(decode_packet(&raw).unwrap(), p);
    }
}

#[test]
fn header_reports_serialized_body_length() {
    let p = Packet::request(9, "WRITE", Some(mixed_body()));
    let raw = encode_packet(&p).unwrap();

    let mut body = Vec::new();
    p.body.to_writer(&mut body).unwrap();

    let header = decode_header(&raw[..HEADER_LEN]).unwrap();
    assert_eq!(header.body_length as usize, body.len());
    assert_eq!(raw.len(), HEADER_LEN + body.len());
    assert_eq!(header.id, 9);
    assert_eq!(header.method, "WRITE");
}

#[test]
fn absent_body_encodes_as_empty_document() {
    let raw = encode_packet(&Packet::request(1, "PING", None)).unwrap();
    assert_eq!(&raw[HEADER_LEN..], &[5, 0, 0, 0, 0]);
    let decoded = decode_packet(&raw).unwrap();
    assert!(decoded.body.is_empty());
}

#[test]
fn long_method_is_truncated_to_field_width() {
    let raw = encode_packet(&Packet::request(3, "SYNCMAINPFUPDATE", None)).unwrap();
    let header = decode_header(&raw).unwrap();
    assert_eq!(header.method.len(), METHOD_LEN);
    assert_eq!(header.method, "SYNCMAINPFU");
}

#[test]
fn header_decodes_without_body_bytes() {
    let raw = encode_packet(&Packet::request(5, "GETMSGS", Some(doc! { "chatId": 1_i64 }))).unwrap();
    let header = decode_header(&raw[..HEADER_LEN]).unwrap();
    assert_eq!(header.method, "GETMSGS");
    assert!(header.body_length > 0);

    let err = decode_packet(&raw[..HEADER_LEN]).unwrap_err();
    assert_eq!(err.code().as_str(), "FORMAT");
}

#[test]
fn body_values_survive_with_their_types() {
    let raw = encode_packet(&Packet::request(1, "MSG", Some(mixed_body()))).unwrap();
    let body = decode_packet(&raw).unwrap().body;
    assert_eq!(body.get("chatId"), Some(&Bson::Int64(18_000_000_000)));
    assert_eq!(body.get("count"), Some(&Bson::Int32(30)));
    assert_eq!(body.get_bool("noSeen").unwrap(), false);
    assert_eq!(body.get_str("msg").unwrap(), "안녕하세요 hello");
}

#[test]
fn packet_ids_are_monotonic_from_one() {
    let ids = PacketIds::new();
    assert_eq!(ids.next_id(), 1);
    assert_eq!(ids.next_id(), 2);
    assert_eq!(ids.next_id(), 3);
}
