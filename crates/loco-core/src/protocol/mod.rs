//! Protocol modules (packet codec + legacy secure channel).
//!
//! - `packet`: the fixed 22-byte header followed by a BSON document body.
//! - `secure`: RSA-wrapped key handshake and AES-128-CFB frames used by the
//!   legacy plain-TCP transport.
//!
//! All parsers are panic-free: malformed input is reported as `LocoError`
//! instead of panicking or indexing raw buffers.

pub mod packet;
pub mod secure;

/// Discovery ("booking") method name.
pub const METHOD_GETCONF: &str = "GETCONF";
/// Server assignment method name.
pub const METHOD_CHECKIN: &str = "CHECKIN";
/// Authentication method name.
pub const METHOD_LOGINLIST: &str = "LOGINLIST";
