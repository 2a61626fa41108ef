//! Frame I/O for both transport modes.
//!
//! - Raw: 22-byte header, then exactly `body_length` bytes.
//! - Secure: u32 LE size, then exactly `size` bytes (IV + ciphertext), decrypted before decoding.
//!
//! A read never starts the next frame until the current one is fully consumed.

use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use loco_core::error::{LocoError, Result};
use loco_core::protocol::packet::{decode_header, decode_packet, encode_packet, Packet, HEADER_LEN};
use loco_core::protocol::secure::{SecureChannel, FRAME_PREFIX_LEN};

use crate::transport::TransportMode;

/// Per-connection framing state.
#[derive(Debug, Clone)]
pub enum Framing {
    Raw,
    Secure(Arc<SecureChannel>),
}

impl Framing {
    /// Fresh framing for a new connection (new key in legacy mode).
    pub fn for_mode(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Tls => Framing::Raw,
            TransportMode::Legacy => Framing::Secure(Arc::new(SecureChannel::new())),
        }
    }

    pub fn mode(&self) -> TransportMode {
        match self {
            Framing::Raw => TransportMode::Tls,
            Framing::Secure(_) => TransportMode::Legacy,
        }
    }

    /// Bytes to flush before the first frame, if any.
    pub fn handshake(&self) -> Result<Option<Bytes>> {
        match self {
            Framing::Raw => Ok(None),
            Framing::Secure(ch) => ch.build_handshake().map(Some),
        }
    }

    /// Encode (and encrypt, in legacy mode) one packet into wire bytes.
    pub fn seal(&self, packet: &Packet) -> Result<Bytes> {
        let raw = encode_packet(packet)?;
        match self {
            Framing::Raw => Ok(raw),
            Framing::Secure(ch) => ch.encrypt(&raw),
        }
    }
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> Result<()> {
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one frame and decode it.
pub async fn read_packet<R: AsyncRead + Unpin>(
    reader: &mut R,
    framing: &Framing,
    max_frame_bytes: usize,
) -> Result<Packet> {
    match framing {
        Framing::Raw => {
            let mut header = [0u8; HEADER_LEN];
            reader.read_exact(&mut header).await?;
            let body_len = decode_header(&header)?.body_length as usize;
            check_len(body_len, max_frame_bytes)?;

            let mut buf = vec![0u8; HEADER_LEN + body_len];
            buf[..HEADER_LEN].copy_from_slice(&header);
            reader.read_exact(&mut buf[HEADER_LEN..]).await?;
            decode_packet(&buf)
        }
        Framing::Secure(ch) => {
            let mut size = [0u8; FRAME_PREFIX_LEN];
            reader.read_exact(&mut size).await?;
            let size = u32::from_le_bytes(size) as usize;
            check_len(size, max_frame_bytes)?;

            let mut body = vec![0u8; size];
            reader.read_exact(&mut body).await?;
            let plain = ch.decrypt(&body)?;
            decode_packet(&plain)
        }
    }
}

fn check_len(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(LocoError::Format(format!(
            "frame too large: {len} > {max}"
        )));
    }
    Ok(())
}
