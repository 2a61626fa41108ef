//! High-level commands over an open session.
//!
//! Each is a single `send`; reply bodies are decoded into record views where one
//! exists, otherwise returned as-is. Status codes are left to the caller.

use bson::{doc, Document};

use loco_core::error::Result;
use loco_core::model::{doc_array_docs, ChatMessage, ChatRoom};

use crate::session::Session;

impl Session {
    /// `LCHATLIST`: refresh the room inventory.
    pub async fn chat_list(&self) -> Result<Vec<ChatRoom>> {
        let reply = self
            .send(
                "LCHATLIST",
                Some(doc! {
                    "chatIds": [],
                    "maxIds": [],
                    "lastTokenId": 0_i64,
                    "lastChatId": 0_i64,
                }),
            )
            .await?;

        let rooms: Vec<ChatRoom> = doc_array_docs(&reply.body, "chatDatas")
            .into_iter()
            .map(ChatRoom::from_doc)
            .collect();
        self.record_rooms(&rooms);
        Ok(rooms)
    }

    /// `GETMSGS`: up to `count` logs, optionally starting from `from_log_id`.
    pub async fn messages(&self, chat_id: i64, count: i32, from_log_id: Option<i64>) -> Result<Vec<ChatMessage>> {
        let mut body = doc! { "chatId": chat_id, "count": count };
        if let Some(log_id) = from_log_id.filter(|id| *id != 0) {
            body.insert("logId", log_id);
        }

        let reply = self.send("GETMSGS", Some(body)).await?;
        Ok(doc_array_docs(&reply.body, "chatLogs")
            .into_iter()
            .map(|log| ChatMessage::from_doc(log, chat_id))
            .collect())
    }

    /// `WRITE`: post a message. Type 1 is plain text.
    pub async fn send_text(&self, chat_id: i64, text: &str, msg_type: i32) -> Result<Document> {
        let reply = self
            .send(
                "WRITE",
                Some(doc! {
                    "chatId": chat_id,
                    "msg": text,
                    "type": msg_type,
                    "noSeen": false,
                }),
            )
            .await?;
        Ok(reply.body)
    }

    /// `GETMEM`: member documents of a room.
    pub async fn members(&self, chat_id: i64) -> Result<Vec<Document>> {
        let reply = self.send("GETMEM", Some(doc! { "chatId": chat_id })).await?;
        Ok(doc_array_docs(&reply.body, "members")
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn chat_info(&self, chat_id: i64) -> Result<Document> {
        Ok(self.send("CHATINFO", Some(doc! { "chatId": chat_id })).await?.body)
    }

    /// `NOTIREAD`: move the read watermark.
    pub async fn mark_read(&self, chat_id: i64, log_id: i64) -> Result<Document> {
        let reply = self
            .send("NOTIREAD", Some(doc! { "chatId": chat_id, "watermark": log_id }))
            .await?;
        Ok(reply.body)
    }

    pub async fn ping(&self) -> Result<()> {
        self.send("PING", Some(Document::new())).await.map(|_| ())
    }
}
