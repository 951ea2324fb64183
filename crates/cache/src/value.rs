//! Encoding of cached values into the string form the storage layer holds.

use storybook_extract::models::{Character, PageAsset, SoundClip};

/// A value that can be stored in the cache.
///
/// Structured values are stored as JSON; binary payloads are already text
/// (base64 or data URLs) and are stored as-is.
pub trait CacheValue: Sized {
    fn encode(&self) -> Result<String, serde_json::Error>;
    fn decode(raw: String) -> Result<Self, serde_json::Error>;
}

macro_rules! json_value {
    ($type:ty) => {
        impl CacheValue for $type {
            fn encode(&self) -> Result<String, serde_json::Error> {
                serde_json::to_string(self)
            }
            fn decode(raw: String) -> Result<Self, serde_json::Error> {
                serde_json::from_str(&raw)
            }
        }
    };
}

json_value!(PageAsset);
json_value!(Vec<Character>);

/// Raw text, such as a bare base64 illustration.
impl CacheValue for String {
    fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(self.clone())
    }
    fn decode(raw: String) -> Result<Self, serde_json::Error> {
        Ok(raw)
    }
}

impl CacheValue for SoundClip {
    fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(self.0.clone())
    }
    fn decode(raw: String) -> Result<Self, serde_json::Error> {
        Ok(SoundClip(raw))
    }
}
