//! Content classification and parser dispatch
//!
//! A response is routed to one of two extractors by its declared content
//! type, matched by substring against a fixed, ordered table:
//! - markup (`text/html`) goes to the structural extractor
//! - plain text, markdown, CSV, JSON and XML go to the verbatim extractor
//!
//! Anything else is recorded as unsupported. After extraction the link list
//! is run through the URL normalization pipeline.

mod markup;
mod verbatim;

pub use markup::{extract_markup, META_CONTENT_KEYS, TEXT_TAGS};
pub use verbatim::extract_verbatim;

use crate::crawler::{BodyStream, FetchError};
use crate::state::{CrawlTarget, TargetError};
use crate::url::normalize_links;
use futures::StreamExt;
use url::Url;

/// Text and raw links produced by an extractor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub text: Vec<String>,
    pub links: Vec<String>,
}

/// The closed set of extractors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// Tag-aware extraction of text and links
    Markup,
    /// Whole body kept as one text entry
    Verbatim,
}

impl ParserKind {
    /// Runs the extractor over a complete body
    pub fn extract(self, body: &[u8]) -> Extracted {
        match self {
            Self::Markup => extract_markup(&String::from_utf8_lossy(body)),
            Self::Verbatim => extract_verbatim(body),
        }
    }
}

/// Supported content types, in match order
pub const CONTENT_TYPES: &[(&str, ParserKind)] = &[
    ("text/html", ParserKind::Markup),
    ("text/plain", ParserKind::Verbatim),
    ("text/markdown", ParserKind::Verbatim),
    ("text/csv", ParserKind::Verbatim),
    ("application/json", ParserKind::Verbatim),
    ("application/xml", ParserKind::Verbatim),
];

/// Finds the parser for a `Content-Type` header value
///
/// Returns the canonical content type recorded on the target together with
/// the extractor to use, or `None` if the type is unsupported.
///
/// # Examples
///
/// ```
/// use driftnet::parser::{classify, ParserKind};
///
/// assert_eq!(
///     classify("text/html; charset=utf-8"),
///     Some(("text/html", ParserKind::Markup))
/// );
/// assert_eq!(classify("image/png"), None);
/// ```
pub fn classify(content_type: &str) -> Option<(&'static str, ParserKind)> {
    let content_type = content_type.to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(pattern, _)| content_type.contains(pattern))
        .copied()
}

/// Reads a body to the end, stopping early on the first stream error
///
/// Returns every byte received before the error together with the error.
pub async fn read_body(mut body: BodyStream) -> (Vec<u8>, Option<FetchError>) {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(e) => return (bytes, Some(e)),
        }
    }
    (bytes, None)
}

/// Parses a fetched response into the target
///
/// Sets `content_type`, `text` and `links` (normalized and resolved against
/// `page_url`), or sets `error` if no parser handles the content type. The
/// extractor runs exactly once.
pub async fn parse_response(
    target: &mut CrawlTarget,
    page_url: &Url,
    content_type: &str,
    body: BodyStream,
) {
    let Some((canonical, kind)) = classify(content_type) else {
        target.content_type = content_type.to_string();
        target.error = Some(TargetError::UnsupportedContentType(
            content_type.to_string(),
        ));
        return;
    };
    target.content_type = canonical.to_string();

    let (bytes, read_error) = read_body(body).await;

    let extracted = match read_error {
        Some(e) => {
            tracing::warn!(url = %target.url, error = %e, "failed to read response body");
            match kind {
                // Whatever markup arrived is still worth extracting
                ParserKind::Markup => kind.extract(&bytes),
                ParserKind::Verbatim => Extracted::default(),
            }
        }
        None => kind.extract(&bytes),
    };

    target.text.extend(extracted.text);
    target.links = normalize_links(extracted.links, page_url);
}
