//! # Access Restriction
//!
//! Decides whether a request is allowed based on the client address, the
//! requested path, caller permissions and, optionally, the client's country.
//!
//! ## Features
//!
//! - **Address Allowlist**: Exact addresses and last-octet ranges
//!   (`192.168.1.10-20`)
//! - **Path Modes**: Whitelist or blacklist paths with `*` wildcards
//! - **Role Bypass**: A permission that exempts its holders, with account
//!   pages kept reachable
//! - **Country Rules**: Whitelist or blacklist countries through a
//!   [`GeoLookup`]
//! - **List Stores**: In-memory and TOML file storage for the lists
//!
//! ## Usage
//!
//! ```ignore
//! use restrict_ip::access_control::{
//!     MemoryListStore, RequestContext, RequestOutcome, RestrictIpConfig, RestrictIpHandler,
//! };
//!
//! let store = MemoryListStore::new().with_allowed_addresses(["10.0.0.1"]);
//! let handler = RestrictIpHandler::new(RestrictIpConfig::new().enabled(), Arc::new(store));
//!
//! match handler.check(&RequestContext::new(client_ip, path)) {
//!     RequestOutcome::Pass => { /* process request */ },
//!     RequestOutcome::Redirect { location, .. } => { /* send redirect */ },
//! }
//! ```

mod address_list;
mod config;
mod context;
mod engine;
mod geo;
mod handler;
mod ip_range;
mod path_rule;
pub mod store;

pub use address_list::parse_address_list;
pub use config::{BypassAction, CountryMode, PathMode, RestrictIpConfig};
pub use context::{
    available_permissions, normalize_path, RequestContext, ACCOUNT_PATHS, BYPASS_PERMISSION,
    PASSWORD_RESET_PREFIX,
};
pub use engine::{AccessDecisionEngine, AccessLists, BlockAction, Decision, EvaluationScope};
pub use geo::{GeoLookup, StaticGeoLookup};
pub use handler::{
    DeniedPage, DeniedPageContent, RequestOutcome, RestrictIpHandler, RestrictIpStats,
    ACCESS_DENIED_MESSAGE,
};
pub use ip_range::{ip_matches, AddressToken};
pub use path_rule::{parse_path_list, GlobPathMatcher, PathMatcher};
pub use store::{
    FileListStore, ListDocument, ListKind, ListStore, MemoryListStore, SharedListStore,
    StoreError, StoreResult,
};
