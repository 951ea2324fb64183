use serde::{Deserialize, Serialize};
use storybook_extract::models::Book;

/// Longest book segment kept in a key; leaves room for the namespace prefix
/// and page suffix under the storage key limit.
const MAX_SEGMENT_LENGTH: usize = 160;

/// Kinds of cached values, each stored under its own key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Complete page assets, JSON encoded.
    Asset,
    /// Bare base64 illustrations from the older cache layout.
    Illustration,
    /// Sound effect data URLs.
    Sound,
    /// Per-book character lists, JSON encoded. Keys carry no page part.
    Characters,
}
impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Asset => "book-asset-cache-",
            Self::Illustration => "book-illustration-cache-",
            Self::Sound => "book-sound-cache-",
            Self::Characters => "book-character-cache-",
        }
    }

    /// Whether keys in this namespace are per page rather than per book.
    pub fn is_paged(&self) -> bool {
        !matches!(self, Self::Characters)
    }
}

/// Which property of a book identifies it in cache keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStrategy {
    /// Sanitized title. Distinct titles that sanitize identically share
    /// entries (`"My Book!"` and `"My Book?"`).
    #[default]
    Title,
    /// Content fingerprint. Survives renames, never collides.
    Fingerprint,
}
impl KeyStrategy {
    pub fn segment(&self, book: &Book) -> String {
        match self {
            Self::Title => sanitize(&book.title),
            Self::Fingerprint => book.fingerprint.clone(),
        }
    }

    /// Builds the storage key for a book (and page, in paged namespaces).
    ///
    /// ```
    /// use storybook_cache::{KeyStrategy, Namespace};
    /// use storybook_extract::models::{Book, Cover};
    ///
    /// let book = Book::from_texts("My Book", Cover::url("cover.jpg"), &["Once."]);
    /// assert_eq!(KeyStrategy::Title.key(Namespace::Asset, &book, 1), "book-asset-cache-My-Book-p1");
    /// assert_eq!(KeyStrategy::Title.key(Namespace::Characters, &book, 1), "book-character-cache-My-Book");
    /// ```
    pub fn key(&self, namespace: Namespace, book: &Book, page_number: u32) -> String {
        let segment = self.segment(book);
        if namespace.is_paged() {
            format!("{}{segment}-p{page_number}", namespace.prefix())
        } else {
            format!("{}{segment}", namespace.prefix())
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9]` with `-`.
///
/// Each `char` maps to exactly one `-`, so the output is always ASCII.
/// Overlong titles are cut to a fixed length.
pub fn sanitize(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .take(MAX_SEGMENT_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use storybook_extract::models::Cover;

    fn book(title: &str) -> Book {
        Book::from_texts(title, Cover::url("cover.jpg"), &["One.", "Two."])
    }

    #[rstest]
    #[case("MyBook", "MyBook")]
    #[case("My Book", "My-Book")]
    #[case("The Great Gatsby!", "The-Great-Gatsby-")]
    #[case("Café au lait", "Caf--au-lait")]
    #[case("", "")]
    fn test_sanitize(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(sanitize(title), expected);
    }

    #[test]
    fn test_sanitize_truncates() {
        let title = "a".repeat(500);
        let sanitized = sanitize(&title);
        assert_eq!(sanitized.len(), MAX_SEGMENT_LENGTH);
        let key = KeyStrategy::Title.key(Namespace::Illustration, &book(&title), u32::MAX);
        assert!(storybook_storage::validate_key(&key).is_ok());
    }

    #[rstest]
    #[case(Namespace::Asset, 1, "book-asset-cache-MyBook-p1")]
    #[case(Namespace::Illustration, 2, "book-illustration-cache-MyBook-p2")]
    #[case(Namespace::Sound, 12, "book-sound-cache-MyBook-p12")]
    #[case(Namespace::Characters, 3, "book-character-cache-MyBook")]
    fn test_title_keys(#[case] namespace: Namespace, #[case] page: u32, #[case] expected: &str) {
        assert_eq!(KeyStrategy::Title.key(namespace, &book("MyBook"), page), expected);
    }

    #[test]
    fn test_title_collision_is_avoided_by_fingerprint() {
        let a = Book::from_texts("My Book!", Cover::url("x"), &["first story"]);
        let b = Book::from_texts("My Book?", Cover::url("x"), &["second story"]);
        assert_eq!(KeyStrategy::Title.key(Namespace::Asset, &a, 1), KeyStrategy::Title.key(Namespace::Asset, &b, 1));
        assert_ne!(
            KeyStrategy::Fingerprint.key(Namespace::Asset, &a, 1),
            KeyStrategy::Fingerprint.key(Namespace::Asset, &b, 1)
        );
        let key = KeyStrategy::Fingerprint.key(Namespace::Asset, &a, 1);
        assert_eq!(key, format!("book-asset-cache-{}-p1", a.fingerprint));
    }
}
