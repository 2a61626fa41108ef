#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bson::doc;

use loco_core::model::{doc_array_docs, doc_i64, ChatMessage, ChatRoom, Credentials};

#[test]
fn room_reads_any_integer_width() {
    let room = ChatRoom::from_doc(&doc! {
        "chatId": 77_i64,
        "type": "MultiChat",
        "lastLogId": 12_i32,
        "lastSeenLogId": 11.0,
    });
    assert_eq!(room.chat_id, 77);
    assert_eq!(room.kind, "MultiChat");
    assert_eq!(room.last_log_id, 12);
    assert_eq!(room.last_seen_log_id, 11);
}

#[test]
fn message_falls_back_to_request_chat_id() {
    let msg = ChatMessage::from_doc(
        &doc! { "logId": 5_i64, "authorId": 9_i32, "message": "hi", "sendAt": 1_700_000_000 },
        321,
    );
    assert_eq!(msg.chat_id, 321);
    assert_eq!(msg.msg_type, 1);
    assert_eq!(msg.author_nickname, "");
    assert_eq!(msg.message, "hi");
}

#[test]
fn array_helper_skips_non_documents() {
    let body = doc! { "chatDatas": [ { "chatId": 1 }, "junk", { "chatId": 2 } ] };
    let ids: Vec<i64> = doc_array_docs(&body, "chatDatas")
        .into_iter()
        .filter_map(|d| doc_i64(d, "chatId"))
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(doc_array_docs(&body, "missing").is_empty());
}

#[test]
fn credentials_parse_saved_json() {
    let raw = r#"{
        "oauth_token": "tok",
        "user_id": 1234,
        "device_uuid": "dev",
        "app_version": "3.7.0",
        "user_agent": "KT/3.7.0 Mc/15.0 ko",
        "a_header": "mac/3.7.0/ko"
    }"#;
    let creds: Credentials = serde_json::from_str(raw).unwrap();
    assert_eq!(creds.user_id, 1234);
    assert_eq!(creds.device_name, "loco-client");
}
