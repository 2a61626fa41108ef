use std::time::Duration;

use serde::Deserialize;

use loco_core::error::{LocoError, Result};

use crate::transport::TransportMode;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub booking: BookingSection,

    #[serde(default)]
    pub checkin: CheckinSection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub device: DeviceSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            booking: BookingSection::default(),
            checkin: CheckinSection::default(),
            session: SessionSection::default(),
            device: DeviceSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(LocoError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.booking.host.is_empty() {
            return Err(LocoError::Config("booking.host must not be empty".into()));
        }

        self.checkin.validate()?;
        self.session.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookingSection {
    #[serde(default = "default_booking_host")]
    pub host: String,

    #[serde(default = "default_booking_port")]
    pub port: u16,
}

impl Default for BookingSection {
    fn default() -> Self {
        Self {
            host: default_booking_host(),
            port: default_booking_port(),
        }
    }
}

/// One checkin attempt. `port: None` means the candidate port from booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeStep {
    pub mode: TransportMode,
    #[serde(default)]
    pub port: Option<u16>,
}

impl ProbeStep {
    pub fn resolve_port(&self, candidate: u16) -> u16 {
        self.port.unwrap_or(candidate)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckinSection {
    /// Used when the booking reply carries no port list.
    #[serde(default = "default_loco_ports")]
    pub default_ports: Vec<u16>,

    /// Used when neither booking nor checkin name a port.
    #[serde(default = "default_loco_port")]
    pub default_port: u16,

    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,

    #[serde(default = "default_probe")]
    pub probe: Vec<ProbeStep>,
}

impl Default for CheckinSection {
    fn default() -> Self {
        Self {
            default_ports: default_loco_ports(),
            default_port: default_loco_port(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            probe: default_probe(),
        }
    }
}

impl CheckinSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=60000).contains(&self.attempt_timeout_ms) {
            return Err(LocoError::Config(
                "checkin.attempt_timeout_ms must be between 1000 and 60000".into(),
            ));
        }
        if self.probe.is_empty() {
            return Err(LocoError::Config("checkin.probe must not be empty".into()));
        }
        Ok(())
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl SessionSection {
    pub fn validate(&self) -> Result<()> {
        if !(1000..=300000).contains(&self.request_timeout_ms) {
            return Err(LocoError::Config(
                "session.request_timeout_ms must be between 1000 and 300000".into(),
            ));
        }
        if self.max_frame_bytes < 1024 {
            return Err(LocoError::Config(
                "session.max_frame_bytes must be at least 1024".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Device fields sent with GETCONF / CHECKIN / LOGINLIST.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceSection {
    #[serde(default = "default_os")]
    pub os: String,
    #[serde(default = "default_mccmnc")]
    pub mccmnc: String,
    #[serde(default)]
    pub model: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_country_iso")]
    pub country_iso: String,
    #[serde(default)]
    pub ntype: i32,
    #[serde(default = "default_dtype")]
    pub dtype: i32,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default = "default_checkin_app_version")]
    pub checkin_app_version: String,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            os: default_os(),
            mccmnc: default_mccmnc(),
            model: String::new(),
            lang: default_lang(),
            country_iso: default_country_iso(),
            ntype: 0,
            dtype: default_dtype(),
            protocol_version: default_protocol_version(),
            checkin_app_version: default_checkin_app_version(),
        }
    }
}

fn default_booking_host() -> String {
    "booking-loco.kakao.com".into()
}
fn default_booking_port() -> u16 {
    443
}
fn default_loco_ports() -> Vec<u16> {
    vec![5223, 5228, 9282, 5242, 10009, 995, 8080]
}
fn default_loco_port() -> u16 {
    5223
}
fn default_attempt_timeout_ms() -> u64 {
    10000
}
fn default_probe() -> Vec<ProbeStep> {
    vec![
        ProbeStep { mode: TransportMode::Tls, port: Some(443) },
        ProbeStep { mode: TransportMode::Tls, port: None },
        ProbeStep { mode: TransportMode::Legacy, port: None },
    ]
}
fn default_request_timeout_ms() -> u64 {
    30000
}
fn default_max_frame_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_os() -> String {
    "mac".into()
}
fn default_mccmnc() -> String {
    "99999".into()
}
fn default_lang() -> String {
    "ko".into()
}
fn default_country_iso() -> String {
    "KR".into()
}
fn default_dtype() -> i32 {
    2
}
fn default_protocol_version() -> String {
    "1".into()
}
fn default_checkin_app_version() -> String {
    "4.5.0".into()
}
