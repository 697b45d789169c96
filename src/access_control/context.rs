//! Per-request inputs to the decision.

use std::collections::HashSet;

use super::config::RestrictIpConfig;

/// Permission that exempts its holder from restriction.
pub const BYPASS_PERMISSION: &str = "bypass ip restriction";

/// Account pages that stay reachable when role bypass is on.
pub const ACCOUNT_PATHS: [&str; 5] = [
    "/user",
    "/user/login",
    "/user/password",
    "/user/logout",
    "/user/register",
];

/// Prefix of one-time login links, reachable when role bypass is on.
pub const PASSWORD_RESET_PREFIX: &str = "/user/reset/";

/// Permissions this component defines under the given settings.
///
/// The bypass permission only exists while role bypass is enabled.
#[must_use]
pub fn available_permissions(config: &RestrictIpConfig) -> Vec<&'static str> {
    if config.allow_role_bypass {
        vec![BYPASS_PERMISSION]
    } else {
        Vec::new()
    }
}

/// Normalize a request path: lower-cased, exactly one leading `/`.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches('/');
    format!("/{}", trimmed.to_lowercase())
}

/// What the host knows about the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client address as reported by the host.
    pub client_ip: String,

    /// Normalized request path.
    pub current_path: String,

    /// Permissions held by the caller.
    pub permissions: HashSet<String>,
}

impl RequestContext {
    /// Create a context for `client_ip` requesting `path`.
    #[must_use]
    pub fn new(client_ip: impl Into<String>, path: &str) -> Self {
        Self {
            client_ip: client_ip.into(),
            current_path: normalize_path(path),
            permissions: HashSet::new(),
        }
    }

    /// Add a caller permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Add several caller permissions.
    #[must_use]
    pub fn with_permissions(
        mut self,
        permissions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Check whether the caller holds `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the current path is an account page.
    #[must_use]
    pub fn is_account_path(&self) -> bool {
        ACCOUNT_PATHS.contains(&self.current_path.as_str())
            || self.current_path.starts_with(PASSWORD_RESET_PREFIX)
    }
}
