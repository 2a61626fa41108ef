//! LOCO packet codec (panic-free).
//!
//! Header layout (22 bytes, little-endian):
//!
//! ```text
//!  0: id          u32
//!  4: status      i16
//!  6: method      [u8; 11]  ASCII, null-padded / truncated
//! 17: body_type   u8        0 = BSON document
//! 18: body_length u32
//! 22: body        body_length bytes
//! ```
//!
//! Parsing rules:
//! - Never index (`buf[0]`); use `Buf` and `remaining()` checks.
//! - `body_length` is derived from the encoded body, never set by callers.

use std::sync::atomic::{AtomicU32, Ordering};

use bson::Document;
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{LocoError, Result};

/// Fixed header size.
pub const HEADER_LEN: usize = 22;
/// Width of the method field.
pub const METHOD_LEN: usize = 11;
/// Body type for BSON documents.
pub const BODY_TYPE_BSON: u8 = 0;

/// Decoded fixed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketHeader {
    pub id: u32,
    pub status: i16,
    pub method: String,
    pub body_type: u8,
    pub body_length: u32,
}

/// One LOCO packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub id: u32,
    /// 0 on client requests; server-defined codes on replies.
    pub status: i16,
    pub method: String,
    pub body_type: u8,
    pub body: Document,
}

impl Packet {
    /// Client request with status 0 and a BSON body. `None` encodes as an empty document.
    pub fn request(id: u32, method: impl Into<String>, body: Option<Document>) -> Self {
        Self {
            id,
            status: 0,
            method: method.into(),
            body_type: BODY_TYPE_BSON,
            body: body.unwrap_or_default(),
        }
    }
}

/// Monotonic packet id source. Starts at 1.
#[derive(Debug)]
pub struct PacketIds {
    next: AtomicU32,
}

impl PacketIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for PacketIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode header + BSON body.
pub fn encode_packet(packet: &Packet) -> Result<Bytes> {
    let mut body = Vec::new();
    packet
        .body
        .to_writer(&mut body)
        .map_err(|e| LocoError::Format(format!("bson encode failed: {e}")))?;
    let body_length = u32::try_from(body.len())
        .map_err(|_| LocoError::Format("body exceeds u32 length".into()))?;

    let mut method = [0u8; METHOD_LEN];
    let raw = packet.method.as_bytes();
    let n = raw.len().min(METHOD_LEN);
    method[..n].copy_from_slice(&raw[..n]);

    let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
    out.put_u32_le(packet.id);
    out.put_i16_le(packet.status);
    out.put_slice(&method);
    out.put_u8(packet.body_type);
    out.put_u32_le(body_length);
    out.put_slice(&body);
    Ok(out.freeze())
}

/// Decode only the fixed header. Body bytes need not be present.
pub fn decode_header(mut buf: &[u8]) -> Result<PacketHeader> {
    if buf.remaining() < HEADER_LEN {
        return Err(LocoError::Format(format!(
            "header too short: {} < {HEADER_LEN}",
            buf.remaining()
        )));
    }

    let id = buf.get_u32_le();
    let status = buf.get_i16_le();
    let mut method = [0u8; METHOD_LEN];
    buf.copy_to_slice(&mut method);
    let body_type = buf.get_u8();
    let body_length = buf.get_u32_le();

    Ok(PacketHeader {
        id,
        status,
        method: decode_method(&method)?,
        body_type,
        body_length,
    })
}

/// Decode a complete packet. The buffer must hold exactly header + declared body.
pub fn decode_packet(buf: &[u8]) -> Result<Packet> {
    let header = decode_header(buf)?;
    let body = buf.get(HEADER_LEN..).unwrap_or_default();
    let declared = header.body_length as usize;

    if body.len() != declared {
        return Err(LocoError::Format(format!(
            "body length mismatch: declared {declared}, got {}",
            body.len()
        )));
    }

    let body = if body.is_empty() {
        Document::new()
    } else {
        decode_body(body)?
    };

    Ok(Packet {
        id: header.id,
        status: header.status,
        method: header.method,
        body_type: header.body_type,
        body,
    })
}

fn decode_body(mut raw: &[u8]) -> Result<Document> {
    // The document carries its own i32 length; it must cover the whole body.
    let doc_len = raw
        .get(..4)
        .map(|mut b| b.get_i32_le())
        .ok_or_else(|| LocoError::Format("body shorter than document length".into()))?;
    if usize::try_from(doc_len).ok() != Some(raw.len()) {
        return Err(LocoError::Format(format!(
            "document length {doc_len} does not match body length {}",
            raw.len()
        )));
    }

    Document::from_reader(&mut raw)
        .map_err(|e| LocoError::Format(format!("bson decode failed: {e}")))
}

fn decode_method(raw: &[u8; METHOD_LEN]) -> Result<String> {
    let end = raw
        .iter()
        .rposition(|b| *b != 0)
        .map(|i| i + 1)
        .unwrap_or(0);
    let trimmed = &raw[..end];
    if !trimmed.is_ascii() {
        return Err(LocoError::Format("method is not ASCII".into()));
    }
    Ok(trimmed.iter().map(|b| char::from(*b)).collect())
}
