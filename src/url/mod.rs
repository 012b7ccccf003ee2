//! URL handling module for Driftnet
//!
//! This module provides the link normalization pipeline applied to every
//! parsed page, host extraction, whitelist matching and the canonical key
//! pages are stored under.

mod links;
mod normalize;
mod suffixes;

use url::Url;

// Re-export main functions
pub use links::{
    dedupe_links, is_unparseable, normalize_links, remove_unparseable, resolve_link,
    strip_fragment,
};
pub use normalize::store_key;
pub use suffixes::{UNPARSEABLE_FILE_SUFFIXES, UNPARSEABLE_PATH_SUFFIXES};

/// Extracts the host of a URL the way it is compared against the whitelist
///
/// The host is lowercased and carries an explicit non-default port, so
/// `http://127.0.0.1:8080/x` yields `127.0.0.1:8080`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use driftnet::url::host_of;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(host_of(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:3000/").unwrap();
/// assert_eq!(host_of(&url), Some("localhost:3000".to_string()));
/// ```
pub fn host_of(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Checks if a host matches a whitelist pattern
///
/// Two kinds of pattern are supported:
/// 1. Exact: `example.com` matches only `example.com`
/// 2. Wildcard: `*.example.com` matches `example.com` and every subdomain
///
/// Matching is case-insensitive.
pub fn matches_host(pattern: &str, host: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let host = host.to_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

/// Returns true if the host matches any of the whitelist patterns
pub fn is_whitelisted(host: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| matches_host(pattern, host))
}
