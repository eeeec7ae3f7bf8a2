//! Configuration file format.
//!
//! One TOML file configures both sides of the system. Every section is
//! optional and falls back to its defaults.
//!
//! ```toml
//! [capture]
//! device_id = 0
//!
//! [crop]
//! region_width = 300.0
//! region_height = 400.0
//!
//! [server]
//! bind_addr = "0.0.0.0:5000"
//! jwt_secret = "change-me"
//!
//! [pass]
//! utc_offset_minutes = 330
//! ```

use crate::capture::CaptureConfig;
use crate::crop::Size;
use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[server] jwt_secret`.
pub const JWT_SECRET_ENV: &str = "GATE_PASS_JWT_SECRET";

/// Longest pass validity window in hours.
pub const MAX_VALIDITY_HOURS: u32 = 24;

/// Destination sentinel that requires a free-text alternative.
pub const OTHER_DESTINATION: &str = "Other";

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {0} dimensions")]
    InvalidDimensions(&'static str),
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    #[error("invalid cutoff time {0:?} (expected HH:MM)")]
    InvalidCutoff(String),
    #[error("invalid UTC offset of {0} minutes")]
    InvalidOffset(i32),
    #[error("invalid pass validity of {0} hours (must be 1-24)")]
    InvalidValidity(u32),
    #[error("JWT secret is empty (set [server] jwt_secret or {JWT_SECRET_ENV})")]
    MissingSecret,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub crop: CropConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub pass: PassConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise the defaults, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Applies environment overrides.
    pub fn apply_env(&mut self) {
        match std::env::var(JWT_SECRET_ENV) {
            Ok(secret) if !secret.trim().is_empty() => {
                tracing::info!("{JWT_SECRET_ENV} set, overriding configured secret");
                self.server.jwt_secret = secret.trim().to_string();
            }
            _ => tracing::debug!("{JWT_SECRET_ENV} not set"),
        }
    }

    /// Validates every section except the server secret, which is only
    /// required when serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.crop.validate()?;
        self.pass.validate()?;
        Ok(())
    }
}

/// Crop region and output geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Width of the area the captured photo is displayed in.
    pub display_width: f64,
    /// Height of the area the captured photo is displayed in.
    pub display_height: f64,
    /// Fixed crop rectangle width in display units.
    pub region_width: f64,
    /// Fixed crop rectangle height in display units.
    pub region_height: f64,
    /// Width of the final cropped photo in pixels.
    pub output_width: u32,
    /// Height of the final cropped photo in pixels.
    pub output_height: u32,
    /// Extra margin around the region that still grabs it.
    pub grab_tolerance: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            display_width: 640.0,
            display_height: 480.0,
            region_width: 300.0,
            region_height: 400.0,
            output_width: 300,
            output_height: 400,
            grab_tolerance: 10.0,
        }
    }
}

impl CropConfig {
    pub fn display_size(&self) -> Size {
        Size::new(self.display_width, self.display_height)
    }

    pub fn region_size(&self) -> Size {
        Size::new(self.region_width, self.region_height)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.display_width) || !positive(self.display_height) {
            return Err(ConfigError::InvalidDimensions("display"));
        }
        if !positive(self.region_width) || !positive(self.region_height) {
            return Err(ConfigError::InvalidDimensions("crop region"));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(ConfigError::InvalidDimensions("crop output"));
        }
        Ok(())
    }
}

/// Backend service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to.
    pub bind_addr: SocketAddr,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Shared secret for signing bearer tokens.
    pub jwt_secret: String,
    /// Token lifetime in hours.
    pub token_ttl_hours: u32,
    /// Maximum request body size; photos travel inline.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 5000).into(),
            database_path: PathBuf::from("gate-pass.db"),
            jwt_secret: String::new(),
            token_ttl_hours: 48,
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Checks settings needed only when serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(())
    }
}

/// Front-desk client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend.
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Printed pass layout and validity rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// Heading printed above the site line.
    pub title: String,
    /// Site address line.
    pub site: String,
    /// Hours a pass stays valid after issue.
    pub validity_hours: u32,
    /// Same-day time before which a pass never expires, `HH:MM`.
    pub cutoff: String,
    /// Local time zone as minutes east of UTC.
    pub utc_offset_minutes: i32,
    /// Selectable destinations; the last entry is normally the
    /// free-text sentinel.
    pub destinations: Vec<String>,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            title: "Visitor Pass".into(),
            site: "Sinchan Bhavan, Chhatrapati Sambhajinagar".into(),
            validity_hours: 2,
            cutoff: "17:00".into(),
            utc_offset_minutes: 330,
            destinations: [
                "GMIDC Technical-section",
                "GMIDC Accounts-section",
                "GMIDC Dakshata-court-section",
                "GMIDC-Ex Dir",
                "GMIDC-Sup Engr",
                "GMIDC-EE/DySE",
                "CEWRD-Techincal",
                "CEWRD-Corr. Branch",
                "CEWRD-Chief Engr",
                "CEWRD-Ex Engr",
                "QCC",
                "AID",
                "MID-1",
                OTHER_DESTINATION,
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl PassConfig {
    /// The parsed same-day cutoff.
    pub fn cutoff_time(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.cutoff, "%H:%M")
            .map_err(|_| ConfigError::InvalidCutoff(self.cutoff.clone()))
    }

    /// The local time zone.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_VALIDITY_HOURS).contains(&self.validity_hours) {
            return Err(ConfigError::InvalidValidity(self.validity_hours));
        }
        self.cutoff_time()?;
        self.offset()?;
        Ok(())
    }
}
