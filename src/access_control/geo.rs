//! Country lookup for client addresses.

use std::collections::HashMap;

use super::ip_range::AddressToken;

/// Resolves a client address to a two-letter country code.
pub trait GeoLookup: Send + Sync {
    /// Look up the country of `ip`. `None` when the address is unknown.
    fn lookup_country(&self, ip: &str) -> Option<String>;
}

/// Geo lookup backed by a static table of address tokens.
///
/// Entries use the allowlist syntax (exact address or last-octet range) and
/// are checked in insertion order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct StaticGeoLookup {
    entries: Vec<(AddressToken, String)>,
}

impl StaticGeoLookup {
    /// Create an empty lookup table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry mapping `token` to `country`.
    #[must_use]
    pub fn with_entry(mut self, token: &str, country: &str) -> Self {
        self.insert(token, country);
        self
    }

    /// Add an entry mapping `token` to `country`.
    pub fn insert(&mut self, token: &str, country: &str) {
        self.entries
            .push((AddressToken::parse(token), country.trim().to_uppercase()));
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&HashMap<String, String>> for StaticGeoLookup {
    fn from(table: &HashMap<String, String>) -> Self {
        // Sort so lookups do not depend on map iteration order.
        let mut rows: Vec<_> = table.iter().collect();
        rows.sort();

        let mut lookup = Self::new();
        for (token, country) in rows {
            lookup.insert(token, country);
        }
        lookup
    }
}

impl GeoLookup for StaticGeoLookup {
    fn lookup_country(&self, ip: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(token, _)| token.matches(ip))
            .map(|(_, country)| country.clone())
    }
}
