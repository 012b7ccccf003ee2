use crate::parser::Extracted;

/// Stores a plain-text body unchanged as a single text entry
///
/// Used for formats whose content is already readable text (plain, markdown,
/// CSV, JSON, XML). Never yields links.
pub fn extract_verbatim(body: &[u8]) -> Extracted {
    Extracted {
        text: vec![String::from_utf8_lossy(body).into_owned()],
        links: Vec::new(),
    }
}
