use crate::consts::WHITESPACE_REGEX;

/// One page of extracted book text. Immutable once extracted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    /// 1-based, dense within a book
    pub page_number: u32,
    /// Trimmed page text
    pub text: String,
    pub word_count: u32,
}
impl Page {
    /// Builds a page from raw extracted text, trimming it and counting words.
    pub fn new(page_number: u32, text: impl AsRef<str>) -> Self {
        let text = text.as_ref().trim().to_string();
        let word_count = word_count(&text);
        Self { page_number, text, word_count }
    }
}

/// Counts the whitespace-separated words in `text`.
///
/// ```
/// use storybook_extract::models::word_count;
/// assert_eq!(word_count("  Call me   Ishmael.\n"), 3);
/// assert_eq!(word_count(""), 0);
/// ```
pub fn word_count(text: &str) -> u32 {
    let count = WHITESPACE_REGEX.split(text.trim()).filter(|w| !w.is_empty()).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
