//! In-memory providers for testing.
//!
//! Every mock counts its calls and records its requests so tests can assert
//! exactly how often the network would have been touched. Failures can be
//! switched on at runtime, and the image mock can hold calls open until the
//! test releases them, to exercise overlapping requests.

use super::{GeneratedImage, ImageProvider, SoundProvider, TextProvider};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Base64 of the bytes `image`.
pub const MOCK_IMAGE: &str = "aW1hZ2U=";
pub const MOCK_IMAGE_MIME_TYPE: &str = "image/jpeg";

type Reply = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn injected_failure() -> exn::Exn<ErrorKind> {
    exn::Exn::from(ErrorKind::Api { status: 500 })
}

/// Text provider answering from a closure. A `None` reply fails the call.
pub struct MockTextProvider {
    reply: Reply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}
impl MockTextProvider {
    /// Always answers with `reply`, whatever the prompt.
    pub fn new(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::from_fn(move |_| Some(reply.clone()))
    }

    pub fn from_fn(reply: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self { reply: Box::new(reply), calls: AtomicUsize::new(0), prompts: Mutex::new(Vec::new()) }
    }

    /// Fails every call with an HTTP 500.
    pub fn failing() -> Self {
        Self::from_fn(|_| None)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate_json(&self, prompt: &str, _schema: &Value) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        (self.reply)(prompt).ok_or_else(injected_failure)
    }
}

/// Image provider returning [`MOCK_IMAGE`].
pub struct MockImageProvider {
    fail: AtomicBool,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}
impl MockImageProvider {
    pub fn new() -> Self {
        Self { fail: AtomicBool::new(false), gate: None, calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    /// Every call waits for a permit from [`release`](Self::release) before
    /// answering. Calls are counted as soon as they start.
    pub fn gated() -> Self {
        Self { gate: Some(Arc::new(Semaphore::new(0))), ..Self::new() }
    }

    /// Lets `n` waiting (or future) calls complete. No-op unless gated.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(prompt, aspect_ratio)` of every call so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}
impl Default for MockImageProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((prompt.to_string(), aspect_ratio.to_string()));
        }
        if let Some(gate) = &self.gate {
            // A closed semaphore is never produced here; treat it as an open gate.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(GeneratedImage::new(MOCK_IMAGE, MOCK_IMAGE_MIME_TYPE))
    }
}

/// Sound provider returning the bytes `ID3`.
pub struct MockSoundProvider {
    configured: bool,
    fail: AtomicBool,
    calls: AtomicUsize,
}
impl MockSoundProvider {
    pub fn new() -> Self {
        Self { configured: true, fail: AtomicBool::new(false), calls: AtomicUsize::new(0) }
    }

    /// A provider without credentials. It still answers if called, so tests
    /// can prove callers never call it.
    pub fn unconfigured() -> Self {
        Self { configured: false, ..Self::new() }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
impl Default for MockSoundProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SoundProvider for MockSoundProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_sound(&self, _text: &str, _duration_seconds: f32) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }
        Ok(b"ID3".to_vec())
    }
}
