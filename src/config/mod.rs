//! # Configuration System
//!
//! TOML-based configuration for the `restrict-ip` tool: restriction
//! settings, logging, the list store location and an optional static
//! country table.
//!
//! ## Example Configuration
//!
//! ```toml
//! [restrict_ip]
//! enabled = true
//! mode = "whitelist"
//! allow_role_bypass = true
//! bypass_action = "show_login_link"
//! country_mode = "blacklist"
//! country_list = "RU:KP"
//! ip_allowlist = ["10.0.0.1"]
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [store]
//! lists_path = "/var/lib/restrict-ip/lists.toml"
//!
//! [geo.entries]
//! "24.48.0.1-255" = "CA"
//! ```

mod error;
mod loader;
mod types;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use types::{AppConfig, GeoConfig, LogFormat, LogLevel, LoggingConfig, StoreConfig};
pub use validation::{
    BasicValidator, ValidationError, ValidationResult, ValidationSeverity, Validator,
};
