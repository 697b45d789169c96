//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::access_control::{RestrictIpConfig, StaticGeoLookup};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Restriction settings.
    pub restrict_ip: RestrictIpConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// List store location.
    pub store: StoreConfig,

    /// Static country table. Country rules are inactive without it.
    pub geo: Option<GeoConfig>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: LogLevel,

    /// Log format (json, pretty, compact).
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose).
    Trace,
    /// Debug level.
    Debug,
    /// Info level (default).
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level (least verbose).
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-readable).
    Json,
    /// Pretty format with colors (default).
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
}

/// Where the administrator-authored lists are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// TOML document holding the address and path lists.
    pub lists_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lists_path: PathBuf::from("restrict-ip-lists.toml"),
        }
    }
}

/// Static country table, keyed by address token (exact or range).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Address token to two-letter country code.
    pub entries: HashMap<String, String>,
}

impl GeoConfig {
    /// Build the lookup table.
    #[must_use]
    pub fn lookup(&self) -> StaticGeoLookup {
        StaticGeoLookup::from(&self.entries)
    }
}
