//! Test data generators for benchmarks.
//!
//! Deterministic so runs are comparable.

/// Client addresses spread over a few /24 networks.
pub fn client_addresses(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("10.{}.{}.{}", i % 4, (i / 4) % 256, (i * 7) % 256))
        .collect()
}

/// Allowlist entries mixing exact addresses and last-octet ranges.
pub fn allowlist(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i % 3 == 0 {
                format!("192.168.{}.10-{}", i % 256, 10 + i % 200)
            } else {
                format!("172.16.{}.{}", i % 256, (i * 13) % 256)
            }
        })
        .collect()
}

/// Raw allowlist text with comments, as an administrator would paste it.
pub fn raw_address_list(count: usize) -> String {
    let mut raw = String::from("/* office networks */\n");
    for (i, entry) in allowlist(count).into_iter().enumerate() {
        raw.push_str(&entry);
        if i % 5 == 0 {
            raw.push_str(" # branch");
        }
        raw.push('\n');
    }
    raw
}

/// Path patterns with and without wildcards.
pub fn path_patterns(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 3 {
            0 => format!("/node/{i}"),
            1 => format!("/section-{i}/*"),
            _ => format!("/api/v{}/*/items", i % 4),
        })
        .collect()
}

/// Request paths to evaluate.
pub fn request_paths() -> Vec<&'static str> {
    vec![
        "/",
        "/node/1",
        "/node/42",
        "/section-1/article/7",
        "/api/v2/orders/items",
        "/admin/config",
        "/user/login",
    ]
}
