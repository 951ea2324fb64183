//! Configuration loading and validation.
//!
//! Configuration is layered with [figment], each layer overriding the last:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. An optional file, format chosen by extension (`.toml`, `.yaml`/`.yml`,
//!    `.json`).
//! 3. `API_KEY` and `ELEVENLABS_API_KEY`, mapped to the Gemini and sound
//!    provider keys.
//! 4. `STORYBOOK_`-prefixed environment variables, with `__` separating
//!    nested keys: `STORYBOOK_READER__TRANSITION_MS=250`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use storybook_cache::KeyStrategy;
use storybook_generate::provider::{
    DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, DEFAULT_TIMEOUT, GEMINI_BASE_URL, SOUND_BASE_URL,
};
use storybook_generate::{PromptMode, PromptTemplates};

pub const ENV_PREFIX: &str = "STORYBOOK_";
pub const DEFAULT_PLACEHOLDER_COVER: &str = "https://placehold.co/200x280/e0e0e0/777?text=My+Book";
const MIN_SOUND_SECONDS: f32 = 0.5;
const MAX_SOUND_SECONDS: f32 = 22.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub providers: ProvidersConfig,
    pub reader: ReaderConfig,
    pub ingest: IngestConfig,
    pub prompts: PromptTemplates,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Cache directory, absolute. Defaults to the platform cache directory.
    pub path: Option<PathBuf>,
    /// Emulated storage quota in bytes. Unlimited when unset.
    pub quota_bytes: Option<u64>,
    /// Read cached assets but never write new ones.
    pub read_only: bool,
    pub key_strategy: KeyStrategy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub sound: SoundConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    /// Limit on a single request, from connecting to the last response byte.
    pub timeout_seconds: u64,
}
impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: GEMINI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}
impl GeminiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub duration_seconds: f32,
    pub timeout_seconds: u64,
}
impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: SOUND_BASE_URL.to_string(),
            duration_seconds: 5.0,
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}
impl SoundConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Page turn animation length.
    pub transition_ms: u64,
    /// Resolve the next page in the background after every page change.
    pub prefetch: bool,
    pub prompt_mode: PromptMode,
}
impl Default for ReaderConfig {
    fn default() -> Self {
        Self { transition_ms: 500, prefetch: true, prompt_mode: PromptMode::default() }
    }
}

/// What to do when cover generation fails during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverFailure {
    /// Keep the book, with the placeholder cover.
    #[default]
    Placeholder,
    /// Reject the book.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub generate_cover: bool,
    pub cover_failure: CoverFailure,
    pub placeholder_cover: String,
}
impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            generate_cover: true,
            cover_failure: CoverFailure::default(),
            placeholder_cover: DEFAULT_PLACEHOLDER_COVER.to_string(),
        }
    }
}

impl Config {
    /// Loads and validates configuration from every layer.
    ///
    /// `file` is optional; when given it must exist.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(file = ?file, "Loaded configuration");
        Ok(config)
    }

    /// The layered figment, before extraction.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment
            .merge(Env::raw().only(&["API_KEY"]).map(|_| "providers.gemini.api_key".into()))
            .merge(Env::raw().only(&["ELEVENLABS_API_KEY"]).map(|_| "providers.sound.api_key".into()))
            .merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Rejects values that load fine but cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.reader.transition_ms == 0 {
            exn::bail!(ErrorKind::Invalid("reader.transition_ms must be greater than zero".into()));
        }
        let duration = self.providers.sound.duration_seconds;
        if !(MIN_SOUND_SECONDS..=MAX_SOUND_SECONDS).contains(&duration) {
            exn::bail!(ErrorKind::Invalid(format!(
                "providers.sound.duration_seconds must be between {MIN_SOUND_SECONDS} and {MAX_SOUND_SECONDS}, got {duration}"
            )));
        }
        if self.ingest.placeholder_cover.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("ingest.placeholder_cover must not be empty".into()));
        }
        if self.providers.gemini.timeout_seconds == 0 || self.providers.sound.timeout_seconds == 0 {
            exn::bail!(ErrorKind::Invalid("provider timeout_seconds must be greater than zero".into()));
        }
        if let Some(path) = &self.storage.path
            && !path.is_absolute()
        {
            exn::bail!(ErrorKind::Invalid(format!("storage.path must be absolute, got {}", path.display())));
        }
        Ok(())
    }

    /// Cache directory: the configured path, or the platform cache directory.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        ProjectDirs::from("org", "Storybook", "storybook")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .ok_or_raise(|| ErrorKind::NoStorageDirectory)
    }
}
