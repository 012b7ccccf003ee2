use crate::UrlError;
use url::Url;

/// Tracking query parameters dropped from store keys
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Computes the key a crawled page is stored under
///
/// Two URLs that differ only in scheme, host case, fragment, tracking
/// parameters or query parameter order map to the same key, so re-inserting
/// a page overwrites the previous record instead of duplicating it.
///
/// # Key Construction
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase the host (done by the URL parser) and keep a non-default port
/// 3. Keep the path as resolved by the parser (dot segments removed)
/// 4. Remove the fragment
/// 5. Remove tracking query parameters, sort the rest by key
/// 6. Drop the scheme
///
/// # Examples
///
/// ```
/// use driftnet::url::store_key;
///
/// let key = store_key("HTTPS://Example.COM/a/../b?z=1&a=2#top").unwrap();
/// assert_eq!(key, "example.com/b?a=2&z=1");
/// ```
pub fn store_key(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;

    let mut key = host.to_lowercase();
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    key.push_str(url.path());

    let params = filter_and_sort_query_params(&url);
    if !params.is_empty() {
        let query = params
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        key.push('?');
        key.push_str(&query);
    }

    Ok(key)
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
