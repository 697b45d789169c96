//! Restriction settings.

use serde::{Deserialize, Deserializer, Serialize};

/// Path rule selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    /// Paths play no part in the decision.
    #[default]
    Disabled,
    /// Only whitelisted paths are reachable.
    Whitelist,
    /// Every path except blacklisted ones is reachable.
    Blacklist,
}

impl PathMode {
    /// Numeric code used by older settings exports.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Whitelist => 1,
            Self::Blacklist => 2,
        }
    }

    /// Whether a path list is in use.
    #[must_use]
    pub fn is_path_based(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl TryFrom<u8> for PathMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Whitelist),
            2 => Ok(Self::Blacklist),
            other => Err(format!("unknown path mode {other}")),
        }
    }
}

/// Country rule selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryMode {
    /// Countries play no part in the decision.
    #[default]
    Disabled,
    /// Listed countries are allowed.
    Whitelist,
    /// Every country except listed ones is allowed.
    Blacklist,
}

impl CountryMode {
    /// Numeric code used by older settings exports.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Whitelist => 1,
            Self::Blacklist => 2,
        }
    }
}

impl TryFrom<u8> for CountryMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Whitelist),
            2 => Ok(Self::Blacklist),
            other => Err(format!("unknown country mode {other}")),
        }
    }
}

/// What a blocked visitor is offered when role bypass is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassAction {
    /// Send blocked visitors straight to the login page.
    RedirectToLogin,
    /// Show a sign-in link on the denial page.
    ShowLoginLink,
    /// Plain denial.
    #[default]
    GenericDeny,
}

/// Settings for one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestrictIpConfig {
    /// Master switch.
    pub enabled: bool,

    /// Path rule selection.
    pub mode: PathMode,

    /// Let holders of the bypass permission, and the account pages, through.
    pub allow_role_bypass: bool,

    /// Response offered to blocked visitors when role bypass is on.
    pub bypass_action: BypassAction,

    /// Country rule selection.
    pub country_mode: CountryMode,

    /// Two-letter country codes, upper-cased. Accepts an array or a
    /// colon-separated string (`"US:CA"`).
    #[serde(deserialize_with = "deserialize_country_list")]
    pub country_list: Vec<String>,

    /// Deployment-supplied allowlist, merged with the stored one.
    pub ip_allowlist: Vec<String>,

    /// Emit a warning log entry for every blocked request.
    pub log_blocked: bool,

    /// Contact address shown on the denial page.
    pub contact_mail: Option<String>,

    /// Login page.
    pub login_path: String,

    /// Generic access denied page.
    pub access_denied_path: String,

    /// Fallback denial page used when no path mode is active.
    pub fallback_path: String,

    /// Site front page.
    pub front_path: String,
}

impl Default for RestrictIpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: PathMode::Disabled,
            allow_role_bypass: false,
            bypass_action: BypassAction::GenericDeny,
            country_mode: CountryMode::Disabled,
            country_list: Vec::new(),
            ip_allowlist: Vec::new(),
            log_blocked: false,
            contact_mail: None,
            login_path: "/user/login".to_string(),
            access_denied_path: "/restrict_ip/access_denied".to_string(),
            fallback_path: "/access-restricted".to_string(),
            front_path: "/".to_string(),
        }
    }
}

impl RestrictIpConfig {
    /// Create default (disabled) settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn restriction on.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Set the path mode.
    #[must_use]
    pub fn with_mode(mut self, mode: PathMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable role bypass with the given action.
    #[must_use]
    pub fn with_role_bypass(mut self, action: BypassAction) -> Self {
        self.allow_role_bypass = true;
        self.bypass_action = action;
        self
    }

    /// Set the country mode and list.
    #[must_use]
    pub fn with_countries<I, S>(mut self, mode: CountryMode, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.country_mode = mode;
        self.country_list = countries
            .into_iter()
            .map(|c| c.as_ref().trim().to_uppercase())
            .collect();
        self
    }

    /// Add a deployment allowlist entry.
    #[must_use]
    pub fn with_static_address(mut self, address: impl Into<String>) -> Self {
        self.ip_allowlist.push(address.into());
        self
    }

    /// Whether `code` is in the country list, ignoring case.
    #[must_use]
    pub fn lists_country(&self, code: &str) -> bool {
        let code = code.trim().to_uppercase();
        self.country_list.iter().any(|c| *c == code)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), String> {
        for (i, code) in self.country_list.iter().enumerate() {
            if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
                return Err(format!(
                    "country_list[{i}]: '{code}' is not a two-letter country code"
                ));
            }
        }

        for (field, path) in [
            ("login_path", &self.login_path),
            ("access_denied_path", &self.access_denied_path),
            ("fallback_path", &self.fallback_path),
            ("front_path", &self.front_path),
        ] {
            if !path.starts_with('/') {
                return Err(format!("{field}: '{path}' must start with '/'"));
            }
        }

        if let Some(ref mail) = self.contact_mail {
            if !mail.contains('@') {
                return Err(format!("contact_mail: '{mail}' is not an email address"));
            }
        }

        Ok(())
    }
}

fn deserialize_country_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        List(Vec<String>),
    }

    let codes = match Raw::deserialize(deserializer)? {
        Raw::Joined(joined) => joined.split(':').map(str::to_string).collect(),
        Raw::List(list) => list,
    };

    Ok(codes
        .into_iter()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect())
}
