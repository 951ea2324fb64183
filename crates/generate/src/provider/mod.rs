//! Provider traits and implementations.
//!
//! Each generative capability is a small async trait so that the HTTP clients
//! can be swapped for in-memory mocks in tests. Providers are opaque
//! request/response functions: they know nothing about books, pages, or the
//! cache.

mod gemini;
#[cfg(feature = "mock")]
mod mock;
mod sound;

pub use self::gemini::{
    DEFAULT_BASE_URL as GEMINI_BASE_URL, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, GeminiClient,
};
#[cfg(feature = "mock")]
pub use self::mock::{MOCK_IMAGE, MOCK_IMAGE_MIME_TYPE, MockImageProvider, MockSoundProvider, MockTextProvider};
pub use self::sound::{DEFAULT_BASE_URL as SOUND_BASE_URL, ElevenLabsClient, sound_clip};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Limit on a single provider request, from connecting to the last response
/// byte, unless a client is given another.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub type TextHandle = Arc<dyn TextProvider>;
pub type ImageHandle = Arc<dyn ImageProvider>;
pub type SoundHandle = Arc<dyn SoundProvider>;

/// A generated image, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub base64: String,
    pub mime_type: String,
}
impl GeneratedImage {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self { base64: base64.into(), mime_type: mime_type.into() }
    }
}

/// Produces structured text.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Asks for a reply matching `schema` and returns the raw JSON text.
    ///
    /// The reply is NOT validated here; run it through
    /// [`decode`](crate::decode) before trusting it.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}

/// Produces images from a text prompt.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates exactly one image. `aspect_ratio` is a ratio string such as
    /// `"1:1"` or `"3:4"`.
    async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<GeneratedImage>;
}

/// Produces short sound effects from a text description.
#[async_trait]
pub trait SoundProvider: Send + Sync {
    /// Whether a credential is present. Callers check this before asking for
    /// sound so a missing key never turns into a request.
    fn is_configured(&self) -> bool;

    /// Generates encoded audio bytes (MPEG).
    async fn generate_sound(&self, text: &str, duration_seconds: f32) -> Result<Vec<u8>>;
}
