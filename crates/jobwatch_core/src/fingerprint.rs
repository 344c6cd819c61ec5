use sha2::{Digest, Sha256};
use url::Url;

/// Canonical listing URL: scheme, host, port and path. Query and fragment are dropped.
///
/// Returns `None` for anything that does not parse as an absolute URL with a host.
pub fn canonicalize_url(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw.trim()).ok()?;
    if !parsed.has_host() {
        return None;
    }
    parsed.set_query(None);
    parsed.set_fragment(None);
    Some(parsed.into())
}

/// Deterministic listing identity: hex SHA-256 of the canonical URL.
///
/// Malformed input never fails; the raw string (cut at `?`/`#`) is hashed instead.
pub fn fingerprint(url: &str) -> String {
    let canonical = canonicalize_url(url).unwrap_or_else(|| strip_query_raw(url).to_string());
    hex_sha256(&canonical)
}

/// Trimmed raw link cut at the first `?` or `#`.
pub(crate) fn strip_query_raw(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.find(['?', '#']) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    }
}

fn hex_sha256(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
