//! Address token matching.
//!
//! An allowlist entry is either a literal address (`192.168.1.10`, `::1`) or
//! an IPv4 range sharing the first three octets:
//!
//! - `192.168.1.10-192.168.1.20`
//! - `192.168.1.10-20`
//!
//! Range syntax is only recognised when the entry contains exactly one `-`
//! and the start has four numeric octets. Anything else is compared as a
//! literal string, so a malformed range can still only match a client whose
//! address is textually identical to it.

/// Parsed form of an IPv4 range entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OctetRange {
    /// First three octets shared by every address in the range.
    prefix: [u8; 3],
    /// Lowest allowed last octet (inclusive).
    first: u8,
    /// Highest allowed last octet (inclusive).
    last: u8,
}

/// A single allowlist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressToken {
    /// Original text, used for exact matching.
    literal: String,

    /// Range data when the entry parsed as a range.
    range: Option<OctetRange>,
}

impl AddressToken {
    /// Parse an allowlist entry. Never fails.
    #[must_use]
    pub fn parse(token: impl Into<String>) -> Self {
        let literal = token.into();
        let range = Self::parse_range(&literal);
        Self { literal, range }
    }

    /// The entry as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    /// Whether the entry is treated as a range.
    #[must_use]
    pub fn is_range(&self) -> bool {
        self.range.is_some()
    }

    /// Check whether a client address matches this entry.
    #[must_use]
    pub fn matches(&self, client_ip: &str) -> bool {
        if self.literal == client_ip {
            return true;
        }

        let Some(range) = self.range else {
            return false;
        };

        let Some(client) = parse_octets(client_ip) else {
            return false;
        };

        client[..3] == range.prefix && (range.first..=range.last).contains(&client[3])
    }

    fn parse_range(token: &str) -> Option<OctetRange> {
        let mut pieces = token.split('-');
        let (start, end) = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(start), Some(end), None) => (start, end),
            _ => return None,
        };

        let start = parse_octets(start)?;
        // The end is either a bare last octet or a full address whose last
        // octet bounds the range.
        let last = end.rsplit('.').next().and_then(parse_octet)?;

        Some(OctetRange {
            prefix: [start[0], start[1], start[2]],
            first: start[3],
            last,
        })
    }
}

impl From<&str> for AddressToken {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}

impl std::fmt::Display for AddressToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.literal)
    }
}

/// Check a raw allowlist entry against a client address.
#[must_use]
pub fn ip_matches(token: &str, client_ip: &str) -> bool {
    AddressToken::parse(token).matches(client_ip)
}

/// Parse a dotted quad into its four octets, compared numerically so that
/// `001` and `1` are the same octet.
fn parse_octets(ip: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut count = 0;

    for part in ip.split('.') {
        if count == 4 {
            return None;
        }
        octets[count] = parse_octet(part)?;
        count += 1;
    }

    (count == 4).then_some(octets)
}

fn parse_octet(part: &str) -> Option<u8> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
