//! Connection session: one live connection, request/reply correlation by packet id,
//! push delivery, login and the high-level commands built on `send`.

pub mod commands;
pub mod connection;
pub mod login;

pub use connection::{Session, SessionOptions, SessionState};
pub use login::LoginOutcome;
