//! # restrict-ip
//!
//! Per-request access restriction by client address, path, caller
//! permission and country.
//!
//! ## Features
//!
//! - Address allowlist with exact entries and last-octet ranges
//! - Path whitelist and blacklist modes with `*` wildcards
//! - Role bypass that keeps the account pages reachable
//! - Optional country whitelist/blacklist behind a pluggable geo lookup
//! - In-memory and file-backed list storage
//!
//! ## Architecture
//!
//! The [`access_control::AccessDecisionEngine`] is a pure function of the
//! request, the settings and the lists. The
//! [`access_control::RestrictIpHandler`] loads the lists from a
//! [`access_control::ListStore`], runs the engine and maps the decision to a
//! redirect. Settings are read through [`config::ConfigLoader`].

pub mod access_control;
pub mod config;
pub mod logging;
