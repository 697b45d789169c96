//! Storage for the administrator-authored lists.
//!
//! The engine never touches storage. The handler loads the three lists from a
//! [`ListStore`] before each evaluation, so any caching across requests is a
//! store concern and must be dropped whenever the lists are saved.
//!
//! # Built-in Implementations
//!
//! - [`MemoryListStore`] - In-memory lists (tests, embedding)
//! - [`FileListStore`] - TOML document on disk

mod file;
mod memory;

pub use file::FileListStore;
pub use memory::MemoryListStore;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use super::address_list::parse_address_list;
use super::path_rule::parse_path_list;

/// List store error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document could not be parsed.
    #[error("failed to parse list document: {0}")]
    Parse(#[from] toml::de::Error),

    /// Lists could not be serialized.
    #[error("failed to serialize list document: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A lock guarding the lists was poisoned.
    #[error("list store lock poisoned")]
    Poisoned,
}

/// Result type for list store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The lists a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// Allowed client addresses and ranges.
    AllowedAddresses,
    /// Paths reachable in whitelist mode.
    WhitelistedPaths,
    /// Paths denied in blacklist mode.
    BlacklistedPaths,
}

impl ListKind {
    /// Clean administrator-entered text into entries for this list.
    ///
    /// Address lists accept `//`, `#` and `/* */` comments. Path lists only
    /// drop `#` comment lines, since `/*` is part of a wildcard pattern.
    #[must_use]
    pub fn parse_entries(self, raw: &str) -> Vec<String> {
        match self {
            Self::AllowedAddresses => parse_address_list(raw),
            Self::WhitelistedPaths | Self::BlacklistedPaths => parse_path_list(raw),
        }
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllowedAddresses => write!(f, "allowed_addresses"),
            Self::WhitelistedPaths => write!(f, "whitelisted_paths"),
            Self::BlacklistedPaths => write!(f, "blacklisted_paths"),
        }
    }
}

/// Serialized form of every list, shared by the stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListDocument {
    /// Allowed client addresses and ranges.
    pub allowed_addresses: Vec<String>,
    /// Whitelisted path patterns.
    pub whitelisted_paths: Vec<String>,
    /// Blacklisted path patterns.
    pub blacklisted_paths: Vec<String>,
}

impl ListDocument {
    /// Borrow one list.
    #[must_use]
    pub fn list(&self, kind: ListKind) -> &Vec<String> {
        match kind {
            ListKind::AllowedAddresses => &self.allowed_addresses,
            ListKind::WhitelistedPaths => &self.whitelisted_paths,
            ListKind::BlacklistedPaths => &self.blacklisted_paths,
        }
    }

    /// Replace or extend one list.
    pub fn store(&mut self, kind: ListKind, entries: &[String], overwrite: bool) {
        let list = match kind {
            ListKind::AllowedAddresses => &mut self.allowed_addresses,
            ListKind::WhitelistedPaths => &mut self.whitelisted_paths,
            ListKind::BlacklistedPaths => &mut self.blacklisted_paths,
        };
        if overwrite {
            list.clear();
        }
        list.extend_from_slice(entries);
    }
}

/// Storage backend for the address and path lists.
pub trait ListStore: Send + Sync {
    /// Load one list.
    fn load(&self, kind: ListKind) -> StoreResult<Vec<String>>;

    /// Save entries into one list, replacing it when `overwrite` is set and
    /// appending otherwise. Replacement is atomic with respect to readers.
    fn save(&self, kind: ListKind, entries: &[String], overwrite: bool) -> StoreResult<()>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Stored allowlist entries.
    fn allowed_addresses(&self) -> StoreResult<Vec<String>> {
        self.load(ListKind::AllowedAddresses)
    }

    /// Stored whitelist path patterns.
    fn whitelisted_paths(&self) -> StoreResult<Vec<String>> {
        self.load(ListKind::WhitelistedPaths)
    }

    /// Stored blacklist path patterns.
    fn blacklisted_paths(&self) -> StoreResult<Vec<String>> {
        self.load(ListKind::BlacklistedPaths)
    }

    /// Save allowlist entries.
    fn save_allowed_addresses(&self, entries: &[String], overwrite: bool) -> StoreResult<()> {
        self.save(ListKind::AllowedAddresses, entries, overwrite)
    }

    /// Save whitelist path patterns.
    fn save_whitelisted_paths(&self, entries: &[String], overwrite: bool) -> StoreResult<()> {
        self.save(ListKind::WhitelistedPaths, entries, overwrite)
    }

    /// Save blacklist path patterns.
    fn save_blacklisted_paths(&self, entries: &[String], overwrite: bool) -> StoreResult<()> {
        self.save(ListKind::BlacklistedPaths, entries, overwrite)
    }
}

/// A shared list store.
pub type SharedListStore = Arc<dyn ListStore>;
