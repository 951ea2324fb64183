use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(PDF_EXTENSION_REGEX, r"(?i)\.pdf$");
regex!(WHITESPACE_REGEX, r"\s+");

pub(crate) const PDF_MIME_TYPE: &str = "application/pdf";
pub(crate) const OPAQUE_MIME_TYPE: &str = "application/octet-stream";
pub(crate) const PDF_MAGIC: &[u8] = b"%PDF";
