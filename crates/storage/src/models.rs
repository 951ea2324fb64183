//! Storage models.

use time::UtcDateTime;

/// Entry metadata returned by storage backend listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Storage key
    pub key: String,
    /// Stored value size in bytes
    pub size: u64,
    /// Last write timestamp
    pub modified: UtcDateTime,
}
impl Entry {
    pub fn new(key: impl Into<String>, size: u64, modified: UtcDateTime) -> Self {
        Self { key: key.into(), size, modified }
    }
}
