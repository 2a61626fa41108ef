//! Record views decoded from reply bodies, plus the caller-supplied identity.
//!
//! None of these are authoritative state: they are rebuilt from each relevant
//! reply and never persisted by the core.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Authentication identity supplied by the caller. Read-only for the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub oauth_token: String,
    pub user_id: i64,
    pub device_uuid: String,
    #[serde(default = "default_device_name")]
    pub device_name: String,
    pub app_version: String,
    pub user_agent: String,
    pub a_header: String,
}

fn default_device_name() -> String {
    "loco-client".into()
}

/// Chat room summary (login inventory / `LCHATLIST`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatRoom {
    pub chat_id: i64,
    pub kind: String,
    pub last_log_id: i64,
    pub last_seen_log_id: i64,
}

impl ChatRoom {
    pub fn from_doc(doc: &Document) -> Self {
        Self {
            chat_id: doc_i64(doc, "chatId").unwrap_or(0),
            kind: doc_string(doc, "type"),
            last_log_id: doc_i64(doc, "lastLogId").unwrap_or(0),
            last_seen_log_id: doc_i64(doc, "lastSeenLogId").unwrap_or(0),
        }
    }
}

/// One chat log entry (`GETMSGS`, `MSG` pushes).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatMessage {
    pub log_id: i64,
    pub chat_id: i64,
    pub author_id: i64,
    pub author_nickname: String,
    pub message: String,
    pub msg_type: i64,
    pub send_at: i64,
}

impl ChatMessage {
    /// `fallback_chat_id` is used when the log omits `chatId`.
    pub fn from_doc(doc: &Document, fallback_chat_id: i64) -> Self {
        Self {
            log_id: doc_i64(doc, "logId").unwrap_or(0),
            chat_id: doc_i64(doc, "chatId").unwrap_or(fallback_chat_id),
            author_id: doc_i64(doc, "authorId").unwrap_or(0),
            author_nickname: doc_string(doc, "authorNickname"),
            message: doc_string(doc, "message"),
            msg_type: doc_i64(doc, "type").unwrap_or(1),
            send_at: doc_i64(doc, "sendAt").unwrap_or(0),
        }
    }
}

/// Integer field, accepting any BSON numeric width the server happens to use.
pub fn doc_i64(doc: &Document, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

/// String field; numbers are rendered, anything else is empty.
pub fn doc_string(doc: &Document, key: &str) -> String {
    match doc.get(key) {
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::Int32(v)) => v.to_string(),
        Some(Bson::Int64(v)) => v.to_string(),
        _ => String::new(),
    }
}

/// Sub-documents of an array field; non-document entries are skipped.
pub fn doc_array_docs<'a>(doc: &'a Document, key: &str) -> Vec<&'a Document> {
    match doc.get(key) {
        Some(Bson::Array(items)) => items.iter().filter_map(Bson::as_document).collect(),
        _ => Vec::new(),
    }
}
