//! Legacy secure channel: RSA-OAEP key handshake + AES-128-CFB frames.
//!
//! Wire formats (little-endian):
//!
//! ```text
//! handshake (268 bytes):
//!   key_size u32 (256) | key_encrypt_type u32 (16) | payload_encrypt_type u32 (2) | rsa_ciphertext [256]
//!
//! frame:
//!   size u32 (= 16 + len(ciphertext)) | iv [16] | ciphertext
//! ```
//!
//! CFB uses 128-bit segments. Frames carry no MAC; the server does not expect one.

use aes::Aes128;
use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;

use crate::error::{LocoError, Result};

type CfbEnc = cfb_mode::Encryptor<Aes128>;
type CfbDec = cfb_mode::Decryptor<Aes128>;

/// Symmetric key size in bytes.
pub const KEY_LEN: usize = 16;
/// Per-frame IV size in bytes.
pub const IV_LEN: usize = 16;
/// Size of the frame length prefix.
pub const FRAME_PREFIX_LEN: usize = 4;
/// Total handshake blob size.
pub const HANDSHAKE_LEN: usize = 12 + RSA_CIPHERTEXT_LEN;

const RSA_CIPHERTEXT_LEN: usize = 256;
const HANDSHAKE_KEY_SIZE: u32 = 256;
/// RSA-OAEP.
const HANDSHAKE_KEY_ENCRYPT_TYPE: u32 = 16;
/// AES-128-CFB.
const HANDSHAKE_PAYLOAD_ENCRYPT_TYPE: u32 = 2;

/// Server's public key (PKCS#1 DER, 2048-bit, e=3).
const LOCO_RSA_PUBLIC_KEY_DER_B64: &str = concat!(
    "MIIBCAKCAQEAo7B26MRFhR8ZpnDCMarG20Lv0JcX0GBIpcxWkGzRqye53zf/1QF+",
    "fBOhQFtdHD5IeaakmdPGGKckcrC1DKXvHvbupwNp2UE/5mLY4rR5qfchQu5wzubCr",
    "RIEXVKyXEogSiiWjjfwumpJ7j7J8qx6ZRhBYPIvYsQ6QGfNjSpvE9m4KYqwAnY9I",
    "2ydGHnX/OW4+pEIgrIeFSR+DQokeRMI5RmDYUQC6foDBXxX6eF4scw5/mcojvxGG",
    "UXLyqEdH8wSPnULhh8NRH6+PBFfQRpC3JXdsh2kJ3SlvLHd9/pfEGKAEMdPNvMcQ",
    "O/P4on9gbq6RKZVamwwEhBBS2Ajw/RjcQIBAw==",
);

/// Per-connection AES key. Lives as long as the connection.
#[derive(Clone)]
pub struct SecureChannel {
    key: [u8; KEY_LEN],
}

impl std::fmt::Debug for SecureChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureChannel").finish_non_exhaustive()
    }
}

impl SecureChannel {
    /// Fresh channel with a random key.
    pub fn new() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Channel over a known key (the peer side of a test harness).
    pub fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// 268-byte handshake carrying the key wrapped under the embedded RSA key.
    pub fn build_handshake(&self) -> Result<Bytes> {
        let public = server_public_key()?;
        let wrapped = public
            .encrypt(&mut OsRng, Oaep::new::<Sha1>(), &self.key)
            .map_err(|e| LocoError::Crypto(format!("rsa encrypt failed: {e}")))?;
        if wrapped.len() != RSA_CIPHERTEXT_LEN {
            return Err(LocoError::Crypto(format!(
                "unexpected rsa ciphertext length {}",
                wrapped.len()
            )));
        }

        let mut out = BytesMut::with_capacity(HANDSHAKE_LEN);
        out.put_u32_le(HANDSHAKE_KEY_SIZE);
        out.put_u32_le(HANDSHAKE_KEY_ENCRYPT_TYPE);
        out.put_u32_le(HANDSHAKE_PAYLOAD_ENCRYPT_TYPE);
        out.put_slice(&wrapped);
        Ok(out.freeze())
    }

    /// Encrypt under a fresh IV; returns the full frame including the size prefix.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Bytes> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let size = u32::try_from(IV_LEN + plaintext.len())
            .map_err(|_| LocoError::Format("frame exceeds u32 length".into()))?;

        let mut out = BytesMut::with_capacity(FRAME_PREFIX_LEN + IV_LEN + plaintext.len());
        out.put_u32_le(size);
        out.put_slice(&iv);
        let start = out.len();
        out.put_slice(plaintext);

        CfbEnc::new(&self.key.into(), &iv.into()).encrypt(&mut out[start..]);
        Ok(out.freeze())
    }

    /// Decrypt a frame body (everything after the size prefix: IV then ciphertext).
    pub fn decrypt(&self, frame_body: &[u8]) -> Result<Vec<u8>> {
        if frame_body.len() < IV_LEN {
            return Err(LocoError::Format(format!(
                "secure frame shorter than iv: {} < {IV_LEN}",
                frame_body.len()
            )));
        }
        let (iv, ciphertext) = frame_body.split_at(IV_LEN);
        let iv: [u8; IV_LEN] = iv
            .try_into()
            .map_err(|_| LocoError::Format("bad iv length".into()))?;

        let mut plain = ciphertext.to_vec();
        CfbDec::new(&self.key.into(), &iv.into()).decrypt(&mut plain);
        Ok(plain)
    }
}

impl Default for SecureChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn server_public_key() -> Result<RsaPublicKey> {
    let der = Base64
        .decode(LOCO_RSA_PUBLIC_KEY_DER_B64)
        .map_err(|e| LocoError::Crypto(format!("embedded key is not base64: {e}")))?;
    RsaPublicKey::from_pkcs1_der(&der)
        .map_err(|e| LocoError::Crypto(format!("embedded key is not pkcs1: {e}")))
}
