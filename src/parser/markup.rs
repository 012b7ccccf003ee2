//! Structural extractor for HTML
//!
//! The document is walked as a flat sequence of start tags and text runs in
//! document order. Anchors contribute links, recognized `<meta>` tags
//! contribute their `content`, and every text-bearing tag claims the next
//! text run that follows it. A text-bearing tag nested inside another one
//! claims its text first; the enclosing tag then waits for the run after
//! that, so pending claims form a stack that only ever needs its height.

use crate::parser::Extracted;
use crate::url::strip_fragment;
use scraper::node::{Element, Node};
use scraper::Html;

/// Elements whose next text run is collected
pub const TEXT_TAGS: &[&str] = &[
    "p",
    "h",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "strong",
    "b",
    "em",
    "i",
    "u",
    "s",
    "sub",
    "sup",
    "blockquote",
    "cite",
    "code",
    "pre",
    "title",
    "span",
];

/// `<meta>` keys whose `content` is collected as text
pub const META_CONTENT_KEYS: &[&str] = &["description", "keywords", "author"];

enum Token<'a> {
    Start(&'a Element),
    Text(&'a str),
}

/// Extracts text and raw hrefs from an HTML document
///
/// Links are returned exactly as written (minus fragments); resolving them
/// against the page URL is left to the dispatcher.
///
/// # Example
///
/// ```
/// use driftnet::parser::extract_markup;
///
/// let html = r#"<html><body><p>Hello</p><a href="/next#top">next</a></body></html>"#;
/// let extracted = extract_markup(html);
/// assert_eq!(extracted.text, vec!["Hello"]);
/// assert_eq!(extracted.links, vec!["/next"]);
/// ```
pub fn extract_markup(html: &str) -> Extracted {
    let document = Html::parse_document(html);
    let tokens = document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Element(element) => Some(Token::Start(element)),
            Node::Text(text) => Some(Token::Text(&**text)),
            _ => None,
        });

    let mut extracted = Extracted::default();
    let mut pending_text = 0usize;

    for token in tokens {
        match token {
            Token::Start(element) => match element.name() {
                "a" => {
                    if let Some(link) = parse_href(element) {
                        extracted.links.push(link);
                    }
                }
                "meta" => {
                    if let Some(content) = parse_meta(element) {
                        extracted.text.push(content);
                    }
                }
                name if TEXT_TAGS.contains(&name) => pending_text += 1,
                _ => {}
            },
            Token::Text(text) => {
                if pending_text == 0 {
                    continue;
                }
                pending_text -= 1;

                let content = text.trim();
                if !content.is_empty() {
                    extracted.text.push(content.to_string());
                }
            }
        }
    }

    extracted
}

/// Reads the link out of an anchor, skipping mail links and bare fragments
fn parse_href(element: &Element) -> Option<String> {
    let href = element.attr("href")?;
    if href.contains("mailto") {
        return None;
    }

    let link = strip_fragment(href).trim();
    if link.is_empty() {
        None
    } else {
        Some(link.to_string())
    }
}

/// Reads the `content` of a meta tag that carries one of the recognized keys
///
/// The key may be the value of `name`/`property` (the usual spelling) or an
/// attribute name of its own.
fn parse_meta(element: &Element) -> Option<String> {
    let recognized = element.attrs().any(|(key, value)| {
        let key = key.to_ascii_lowercase();
        if META_CONTENT_KEYS.contains(&key.as_str()) {
            return true;
        }
        (key == "name" || key == "property")
            && META_CONTENT_KEYS.contains(&value.trim().to_ascii_lowercase().as_str())
    });

    if !recognized {
        return None;
    }

    element
        .attr("content")
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}
