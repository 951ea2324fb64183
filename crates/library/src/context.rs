//! Shared collaborators for library operations.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use storybook_cache::CacheStore;
use storybook_config::{Config, IngestConfig};
use storybook_extract::DocumentParser;
use storybook_generate::provider::{ElevenLabsClient, GeminiClient};
use storybook_generate::{ImageHandle, PromptMode, Prompts, SoundHandle, TextHandle};
use storybook_storage::BackendHandle;
use storybook_storage::backend::{LocalBackend, ReadOnlyBackend};

/// The generative providers, one per capability.
#[derive(Clone)]
pub struct Providers {
    pub text: TextHandle,
    pub image: ImageHandle,
    pub sound: SoundHandle,
}

/// Everything the resolver, scheduler, reader and ingestion need: the cache,
/// the providers, the document parser, compiled prompts, and settings.
///
/// Cheap to clone; collaborators are shared.
#[derive(Clone)]
pub struct Context {
    pub(crate) cache: CacheStore,
    pub(crate) providers: Providers,
    pub(crate) parser: Arc<dyn DocumentParser>,
    pub(crate) prompts: Arc<Prompts>,
    pub(crate) prompt_mode: PromptMode,
    pub(crate) sound_duration_seconds: f32,
    pub(crate) transition: Duration,
    pub(crate) prefetch: bool,
    pub(crate) ingest: IngestConfig,
}
impl Context {
    /// Assembles a context from explicit collaborators. Settings come from
    /// `config`; its storage and provider sections are ignored.
    pub fn new(
        cache: CacheStore,
        providers: Providers,
        parser: Arc<dyn DocumentParser>,
        config: &Config,
    ) -> Result<Self> {
        config.validate().or_raise(|| ErrorKind::ConfigurationError("settings".into()))?;
        let prompts = Prompts::new(&config.prompts).or_raise(|| ErrorKind::ConfigurationError("prompt templates".into()))?;
        Ok(Self {
            cache,
            providers,
            parser,
            prompts: Arc::new(prompts),
            prompt_mode: config.reader.prompt_mode,
            sound_duration_seconds: config.providers.sound.duration_seconds,
            transition: Duration::from_millis(config.reader.transition_ms),
            prefetch: config.reader.prefetch,
            ingest: config.ingest.clone(),
        })
    }

    /// Builds the production context: a local directory cache and the HTTP
    /// providers, configured from `config`.
    pub fn from_config(config: &Config, parser: Arc<dyn DocumentParser>) -> Result<Self> {
        config.validate().or_raise(|| ErrorKind::ConfigurationError("settings".into()))?;
        let path = config.storage_path().or_raise(|| ErrorKind::Storage)?;
        let mut local = LocalBackend::new("local", &path).or_raise(|| ErrorKind::Storage)?;
        if let Some(quota) = config.storage.quota_bytes {
            local = local.with_quota(quota);
        }
        let backend: BackendHandle =
            if config.storage.read_only { Arc::new(ReadOnlyBackend::new(Arc::new(local))) } else { Arc::new(local) };
        tracing::info!(path = %path.display(), read_only = config.storage.read_only, "Opened asset cache");

        let gemini = &config.providers.gemini;
        let gemini = Arc::new(
            GeminiClient::new(gemini.api_key.clone())
                .with_base_url(&gemini.base_url)
                .with_models(&gemini.text_model, &gemini.image_model)
                .with_timeout(gemini.timeout()),
        );
        let sound = &config.providers.sound;
        let providers = Providers {
            text: gemini.clone(),
            image: gemini,
            sound: Arc::new(
                ElevenLabsClient::new(sound.api_key.clone())
                    .with_base_url(&sound.base_url)
                    .with_timeout(sound.timeout()),
            ),
        };
        Self::new(CacheStore::new(backend, config.storage.key_strategy), providers, parser, config)
    }

    /// [`from_config`](Self::from_config) with the MuPDF document parser.
    #[cfg(feature = "mupdf")]
    pub fn open(config: &Config) -> Result<Self> {
        Self::from_config(config, Arc::new(storybook_extract::MupdfParser))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn transition(&self) -> Duration {
        self.transition
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for this crate's tests.

    use super::*;
    use storybook_extract::error::Result as ExtractResult;
    use storybook_extract::models::{Book, Cover};
    use storybook_generate::provider::{MockImageProvider, MockSoundProvider, MockTextProvider};
    use storybook_storage::backend::MockBackend;

    pub(crate) const SCENE_REPLY: &str = r#"{"imagePrompt":"a watercolor whale","soundEffectPrompt":"waves lapping"}"#;

    /// Handles onto every mock so tests can inspect them after handing them
    /// to a [`Context`].
    pub(crate) struct Mocks {
        pub backend: Arc<MockBackend>,
        pub text: Arc<MockTextProvider>,
        pub image: Arc<MockImageProvider>,
        pub sound: Arc<MockSoundProvider>,
    }
    impl Mocks {
        pub fn new() -> Self {
            Self {
                backend: Arc::new(MockBackend::default()),
                text: Arc::new(MockTextProvider::new(SCENE_REPLY)),
                image: Arc::new(MockImageProvider::new()),
                sound: Arc::new(MockSoundProvider::new()),
            }
        }

        pub fn context(&self) -> Context {
            self.context_with(&Config::default())
        }

        pub fn context_with(&self, config: &Config) -> Context {
            let providers =
                Providers { text: self.text.clone(), image: self.image.clone(), sound: self.sound.clone() };
            let cache = CacheStore::new(self.backend.clone(), config.storage.key_strategy);
            let parser = |bytes: &[u8]| -> ExtractResult<Vec<String>> {
                // "Pages" are separated by form feeds after the magic bytes.
                let text = String::from_utf8_lossy(bytes.strip_prefix(b"%PDF").unwrap_or(bytes)).to_string();
                Ok(text.split('\x0c').filter(|p| !p.trim().is_empty()).map(str::to_string).collect())
            };
            Context::new(cache, providers, Arc::new(parser), config).unwrap()
        }
    }

    pub(crate) fn book(title: &str, pages: &[&str]) -> Book {
        Book::from_texts(title, Cover::url("cover.jpg"), pages)
    }
}
