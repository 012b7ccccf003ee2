//! Link list normalization applied to every parsed page

use crate::url::suffixes::{UNPARSEABLE_FILE_SUFFIXES, UNPARSEABLE_PATH_SUFFIXES};
use std::collections::HashSet;
use url::Url;

/// Removes repeated links, keeping the first occurrence of each
pub fn dedupe_links(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(links.len());
    links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Cuts an href at its first `#`
pub fn strip_fragment(href: &str) -> &str {
    match href.find('#') {
        Some(index) => &href[..index],
        None => href,
    }
}

/// Returns true if the link points at a resource that never yields text
///
/// Only the path is inspected: the query string and fragment are cut off
/// first and the comparison is case-insensitive.
pub fn is_unparseable(link: &str) -> bool {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_lowercase(),
        Err(_) => {
            let end = link.find(['?', '#']).unwrap_or(link.len());
            link[..end].to_lowercase()
        }
    };

    UNPARSEABLE_FILE_SUFFIXES
        .iter()
        .chain(UNPARSEABLE_PATH_SUFFIXES)
        .any(|suffix| path.ends_with(suffix))
}

/// Drops empty links and links matching the suffix deny-lists
pub fn remove_unparseable(links: Vec<String>) -> Vec<String> {
    links
        .into_iter()
        .filter(|link| !link.trim().is_empty() && !is_unparseable(link))
        .collect()
}

/// Resolves a link against the page it was found on
///
/// Relative links inherit the base URL's scheme and host; absolute links
/// pass through. The fragment is removed and anything that does not resolve
/// to an http(s) URL is rejected.
pub fn resolve_link(link: &str, base: &Url) -> Option<String> {
    let mut resolved = base.join(link.trim()).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.host_str()?;

    resolved.set_fragment(None);
    Some(resolved.into())
}

/// Runs the full link pipeline: dedupe, deny-list filter, resolve
///
/// A last dedupe runs after resolution, since a relative and an absolute
/// spelling of the same page collapse to one URL there.
pub fn normalize_links(links: Vec<String>, base: &Url) -> Vec<String> {
    let links = dedupe_links(links);
    let links = remove_unparseable(links);
    let resolved = links
        .iter()
        .filter_map(|link| {
            let resolved = resolve_link(link, base);
            if resolved.is_none() {
                tracing::trace!(link = %link, base = %base, "dropping unresolvable link");
            }
            resolved
        })
        .collect();
    dedupe_links(resolved)
}
