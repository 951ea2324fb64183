//! ElevenLabs sound effect generation over HTTP.

use super::{DEFAULT_TIMEOUT, SoundProvider};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::{OptionExt, ResultExt};
use serde::Serialize;
use std::time::Duration;
use storybook_extract::models::SoundClip;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const AUDIO_MIME_TYPE: &str = "audio/mpeg";

/// Client for the ElevenLabs sound generation API.
#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

/// Wraps encoded audio bytes from a [`SoundProvider`] as a playable data URL.
///
/// ```
/// use storybook_generate::provider::sound_clip;
///
/// assert_eq!(sound_clip(b"ID3").data_url(), "data:audio/mpeg;base64,SUQz");
/// ```
pub fn sound_clip(bytes: &[u8]) -> SoundClip {
    SoundClip(format!("data:{AUDIO_MIME_TYPE};base64,{}", STANDARD.encode(bytes)))
}

#[derive(Debug, Serialize)]
struct SoundRequest<'a> {
    text: &'a str,
    duration_seconds: f32,
}

impl ElevenLabsClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fails requests that take longer than `timeout` with [`ErrorKind::Network`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl SoundProvider for ElevenLabsClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    #[instrument(skip_all, fields(duration_seconds = duration_seconds))]
    async fn generate_sound(&self, text: &str, duration_seconds: f32) -> Result<Vec<u8>> {
        let api_key = self.api_key.as_deref().ok_or_raise(|| ErrorKind::Configuration("ElevenLabs API key".into()))?;
        let url = format!("{}/v1/sound-generation", self.base_url);
        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .header("xi-api-key", api_key)
            .json(&SoundRequest { text, duration_seconds })
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            debug!(%url, %status, %detail, "Provider rejected request");
            exn::bail!(ErrorKind::Api { status: status.as_u16() });
        }
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Network)?;
        if bytes.is_empty() {
            exn::bail!(ErrorKind::EmptyResponse);
        }
        Ok(bytes.to_vec())
    }
}
