//! Where the login identity comes from.
//!
//! Extraction from the desktop app's cache is someone else's job; this crate only
//! reads a value the caller already has (in memory or as a saved JSON file).

use std::fs;
use std::path::{Path, PathBuf};

use loco_core::error::{LocoError, Result};
use loco_core::model::Credentials;

pub trait CredentialsProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;
}

/// Fixed credentials held in memory.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(creds: Credentials) -> Self {
        Self(creds)
    }
}

impl CredentialsProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.0.clone())
    }
}

/// Credentials saved as JSON. Re-read on every call so a refreshed token is picked up.
#[derive(Debug, Clone)]
pub struct JsonFileCredentials {
    path: PathBuf,
}

impl JsonFileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialsProvider for JsonFileCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            LocoError::Config(format!("read credentials {} failed: {e}", self.path.display()))
        })?;
        let creds: Credentials = serde_json::from_str(&raw)
            .map_err(|e| LocoError::Config(format!("invalid credentials json: {e}")))?;
        if creds.oauth_token.is_empty() {
            return Err(LocoError::Config("credentials carry an empty oauth_token".into()));
        }
        Ok(creds)
    }
}
