//! Shared error type across LOCO crates.

use std::time::Duration;

use thiserror::Error;

/// Stable error codes, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed or undersized packet, header/length mismatch.
    Format,
    /// Socket or TLS failure.
    Transport,
    /// Key wrapping or cipher failure.
    Crypto,
    /// No correlated reply within the request deadline.
    Timeout,
    /// The session was closed while the call was in flight.
    Closed,
    /// Booking returned nothing usable.
    Discovery,
    /// Checkin exhausted every transport variant.
    Connection,
    /// Login completed but the identity was not accepted.
    AuthFailed,
    /// Invalid configuration or credentials file.
    Config,
}

impl ErrorCode {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Format => "FORMAT",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Crypto => "CRYPTO",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Closed => "CLOSED",
            ErrorCode::Discovery => "DISCOVERY",
            ErrorCode::Connection => "CONNECTION",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LocoError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum LocoError {
    #[error("format: {0}")]
    Format(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("crypto: {0}")]
    Crypto(String),
    #[error("{method} (id={id}) timed out after {after:?}")]
    Timeout {
        method: String,
        id: u32,
        after: Duration,
    },
    #[error("session closed")]
    Closed,
    #[error("discovery: {0}")]
    Discovery(String),
    #[error("all checkin attempts failed: {}", attempts.join("; "))]
    Connection { attempts: Vec<String> },
    #[error("login rejected (status={status:?})")]
    AuthFailed { status: Option<i64> },
    #[error("config: {0}")]
    Config(String),
}

impl LocoError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            LocoError::Format(_) => ErrorCode::Format,
            LocoError::Transport(_) => ErrorCode::Transport,
            LocoError::Crypto(_) => ErrorCode::Crypto,
            LocoError::Timeout { .. } => ErrorCode::Timeout,
            LocoError::Closed => ErrorCode::Closed,
            LocoError::Discovery(_) => ErrorCode::Discovery,
            LocoError::Connection { .. } => ErrorCode::Connection,
            LocoError::AuthFailed { .. } => ErrorCode::AuthFailed,
            LocoError::Config(_) => ErrorCode::Config,
        }
    }
}

impl From<std::io::Error> for LocoError {
    fn from(e: std::io::Error) -> Self {
        LocoError::Transport(e.to_string())
    }
}
