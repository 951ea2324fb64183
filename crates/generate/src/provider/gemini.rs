//! Gemini text generation and Imagen image generation over HTTP.

use super::{DEFAULT_TIMEOUT, GeneratedImage, ImageProvider, TextProvider};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Client for the Generative Language API.
///
/// One client serves both text (`generateContent`) and images (Imagen
/// `:predict`). Without an API key every call fails with
/// [`ErrorKind::Configuration`] before anything is sent.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
    timeout: Duration,
}
impl GeminiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        self.text_model = text_model.into();
        self.image_model = image_model.into();
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

    fn text_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.text_model)
    }

    fn image_url(&self) -> String {
        format!("{}/models/{}:predict", self.base_url, self.image_model)
    }

    async fn post<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T> {
        let api_key = self.api_key.as_deref().ok_or_raise(|| ErrorKind::Configuration("Gemini API key".into()))?;
        let response = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            debug!(url, %status, %detail, "Provider rejected request");
            exn::bail!(ErrorKind::Api { status: status.as_u16() });
        }
        response.json().await.or_raise(|| ErrorKind::InvalidData)
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    #[instrument(skip_all, fields(model = %self.text_model, prompt_len = prompt.len()))]
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let response: ContentResponse = self.post(&self.text_url(), &text_request(prompt, schema)).await?;
        response.text()
    }
}

#[async_trait]
impl ImageProvider for GeminiClient {
    #[instrument(skip_all, fields(model = %self.image_model, aspect_ratio = aspect_ratio))]
    async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<GeneratedImage> {
        let response: PredictResponse = self.post(&self.image_url(), &image_request(prompt, aspect_ratio)).await?;
        response.image()
    }
}

fn text_request(prompt: &str, schema: &Value) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        },
    })
}

fn image_request(prompt: &str, aspect_ratio: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": aspect_ratio,
            "outputMimeType": IMAGE_MIME_TYPE,
        },
    })
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}
#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}
#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}
impl ContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(self) -> Result<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            exn::bail!(ErrorKind::EmptyResponse);
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}
impl PredictResponse {
    fn image(self) -> Result<GeneratedImage> {
        let prediction = self.predictions.into_iter().find(|p| p.bytes_base64_encoded.is_some());
        let Some(Prediction { bytes_base64_encoded: Some(base64), mime_type }) = prediction else {
            exn::bail!(ErrorKind::EmptyResponse);
        };
        // Reject garbage early so it never reaches the cache.
        STANDARD.decode(base64.as_bytes()).or_raise(|| ErrorKind::InvalidData)?;
        Ok(GeneratedImage::new(base64, mime_type.unwrap_or_else(|| IMAGE_MIME_TYPE.to_string())))
    }
}
