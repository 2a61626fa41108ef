use bson::doc;

use loco_core::error::Result;
use loco_core::model::{doc_array_docs, doc_i64, ChatRoom, Credentials};
use loco_core::protocol::METHOD_LOGINLIST;

use crate::config::DeviceSection;
use crate::session::Session;

/// Result of `LOGINLIST`. Not an error either way: the session only judges I/O success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated { user_id: i64, rooms: Vec<ChatRoom> },
    /// Reply carried no (or a zero) user id.
    Unauthenticated { status: Option<i64> },
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated { .. })
    }
}

impl Session {
    /// Authenticate with the bearer token; on success record the user id and room inventory.
    pub async fn login(&self, creds: &Credentials, device: &DeviceSection) -> Result<LoginOutcome> {
        let body = doc! {
            "os": device.os.as_str(),
            "ntype": device.ntype,
            "appVer": creds.app_version.as_str(),
            "MCCMNC": device.mccmnc.as_str(),
            "prtVer": device.protocol_version.as_str(),
            "duuid": creds.device_uuid.as_str(),
            "oauthToken": creds.oauth_token.as_str(),
            "lang": device.lang.as_str(),
            "dtype": device.dtype,
            "revision": 0,
            "chatIds": [],
            "maxIds": [],
            "lastTokenId": 0_i64,
            "lbk": 0,
            "bg": false,
        };

        let reply = self.send(METHOD_LOGINLIST, Some(body)).await?;
        let user_id = doc_i64(&reply.body, "userId").unwrap_or(0);

        if user_id == 0 {
            let status = doc_i64(&reply.body, "status")
                .or_else(|| (reply.status != 0).then(|| i64::from(reply.status)));
            tracing::info!(?status, "login returned no user id");
            return Ok(LoginOutcome::Unauthenticated { status });
        }

        let rooms: Vec<ChatRoom> = doc_array_docs(&reply.body, "chatDatas")
            .into_iter()
            .map(ChatRoom::from_doc)
            .collect();

        self.record_user(user_id);
        self.record_rooms(&rooms);
        tracing::info!(user_id, rooms = rooms.len(), "logged in");

        Ok(LoginOutcome::Authenticated { user_id, rooms })
    }
}
