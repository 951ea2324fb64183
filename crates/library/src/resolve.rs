//! Asset resolution: cache first, providers on a miss.

use crate::context::Context;
use crate::error::{ErrorKind, Result};
use storybook_cache::Namespace;
use storybook_extract::models::{Book, Character, Page, PageAsset, SoundClip};
use storybook_generate::PromptMode;
use storybook_generate::decode::{self, ScenePrompts};
use storybook_generate::provider::sound_clip;
use tracing::{debug, info, instrument};

const PAGE_ASPECT_RATIO: &str = "1:1";

/// Produces the generated assets for a page, consulting the cache before any
/// provider.
///
/// Resolution is idempotent from the caller's point of view: once an asset
/// has been generated and cached, every later call returns it without
/// touching the network. Failures are never cached.
#[derive(Clone)]
pub struct AssetResolver {
    ctx: Context,
}
impl AssetResolver {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Returns the illustration and sound prompt for a page.
    ///
    /// 1. A cached [`PageAsset`] is returned as-is.
    /// 2. A bare illustration from the older cache layout is upgraded to a
    ///    [`PageAsset`] (with no sound prompt) and written through.
    /// 3. Otherwise prompts are derived from the page text, one image is
    ///    requested, and the result is cached under the same key.
    ///
    /// A page with no text gets an empty asset; nothing is generated or
    /// cached for it.
    #[instrument(skip_all, fields(title = %book.title, page = page.page_number))]
    pub async fn resolve(&self, book: &Book, page: &Page) -> Result<PageAsset> {
        if page.text.trim().is_empty() {
            debug!("Blank page, nothing to illustrate");
            return Ok(PageAsset::new("", ""));
        }
        let cache = &self.ctx.cache;
        if let Some(asset) = cache.get::<PageAsset>(Namespace::Asset, book, page.page_number).await {
            return Ok(asset);
        }
        if let Some(image) = cache.get::<String>(Namespace::Illustration, book, page.page_number).await {
            debug!("Upgrading illustration from the older cache layout");
            let asset = PageAsset::new(image, "");
            cache.set(Namespace::Asset, book, page.page_number, &asset).await;
            return Ok(asset);
        }

        let prompts = self.scene_prompts(book, page).await?;
        let image = self
            .ctx
            .providers
            .image
            .generate_image(&prompts.image_prompt, PAGE_ASPECT_RATIO)
            .await
            .map_err(ErrorKind::generation)?;
        let asset = PageAsset::new(image.base64, prompts.sound_effect_prompt).with_mime_type(image.mime_type);
        cache.set(Namespace::Asset, book, page.page_number, &asset).await;
        info!("Generated page asset");
        Ok(asset)
    }

    /// Returns a sound effect for a page, generating it on a miss.
    ///
    /// A cached clip is returned without checking credentials. Otherwise the
    /// sound provider must be configured; when it is not, nothing is sent and
    /// [`ErrorKind::ConfigurationError`] is returned. A blank `prompt` falls
    /// back to the page's cached sound prompt, then to the page text.
    #[instrument(skip_all, fields(title = %book.title, page = page.page_number))]
    pub async fn resolve_sound(&self, book: &Book, page: &Page, prompt: &str) -> Result<SoundClip> {
        let cache = &self.ctx.cache;
        if let Some(clip) = cache.get::<SoundClip>(Namespace::Sound, book, page.page_number).await {
            return Ok(clip);
        }
        let provider = &self.ctx.providers.sound;
        if !provider.is_configured() {
            exn::bail!(ErrorKind::ConfigurationError("sound provider API key".into()));
        }

        let prompt = match prompt.trim() {
            "" => match cache.get::<PageAsset>(Namespace::Asset, book, page.page_number).await {
                Some(asset) if !asset.sound_effect_prompt.trim().is_empty() => asset.sound_effect_prompt,
                _ => self
                    .ctx
                    .prompts
                    .sound(&book.title, page.page_number, &page.text)
                    .map_err(ErrorKind::generation)?,
            },
            prompt => prompt.to_string(),
        };
        let bytes = provider
            .generate_sound(&prompt, self.ctx.sound_duration_seconds)
            .await
            .map_err(ErrorKind::generation)?;
        let clip = sound_clip(&bytes);
        cache.set(Namespace::Sound, book, page.page_number, &clip).await;
        info!(bytes = bytes.len(), "Generated sound effect");
        Ok(clip)
    }

    /// Returns the book's characters, analysing the whole text on a miss.
    #[instrument(skip_all, fields(title = %book.title))]
    pub async fn characters(&self, book: &Book) -> Result<Vec<Character>> {
        let cache = &self.ctx.cache;
        if let Some(characters) = cache.get::<Vec<Character>>(Namespace::Characters, book, 0).await {
            return Ok(characters);
        }
        let prompt = self.ctx.prompts.characters(&book.title, &book.full_text()).map_err(ErrorKind::generation)?;
        let raw = self
            .ctx
            .providers
            .text
            .generate_json(&prompt, &decode::characters_schema())
            .await
            .map_err(ErrorKind::generation)?;
        let characters = decode::characters(&raw).map_err(ErrorKind::generation)?;
        cache.set(Namespace::Characters, book, 0, &characters).await;
        info!(count = characters.len(), "Analysed book characters");
        Ok(characters)
    }

    async fn scene_prompts(&self, book: &Book, page: &Page) -> Result<ScenePrompts> {
        let prompts = &self.ctx.prompts;
        match self.ctx.prompt_mode {
            PromptMode::Direct => Ok(ScenePrompts {
                image_prompt: prompts
                    .illustration(&book.title, page.page_number, &page.text)
                    .map_err(ErrorKind::generation)?,
                sound_effect_prompt: prompts
                    .sound(&book.title, page.page_number, &page.text)
                    .map_err(ErrorKind::generation)?,
            }),
            PromptMode::Derived => {
                let prompt =
                    prompts.scene(&book.title, page.page_number, &page.text).map_err(ErrorKind::generation)?;
                let raw = self
                    .ctx
                    .providers
                    .text
                    .generate_json(&prompt, &ScenePrompts::schema())
                    .await
                    .map_err(ErrorKind::generation)?;
                decode::scene_prompts(&raw).map_err(ErrorKind::generation)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{Mocks, book};
    use std::sync::Arc;
    use storybook_config::Config;
    use storybook_extract::models::Cover;
    use storybook_generate::provider::{MOCK_IMAGE, MOCK_IMAGE_MIME_TYPE, MockSoundProvider, MockTextProvider};
    use storybook_storage::backend::MockBackend;

    fn my_book() -> Book {
        book("MyBook", &["Call me Ishmael.", "It is a way I have."])
    }

    #[tokio::test]
    async fn test_resolves_and_caches() {
        let mocks = Mocks::new();
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();

        let asset = resolver.resolve(&book, &book.pages[0]).await.unwrap();
        assert_eq!(asset, PageAsset::new(MOCK_IMAGE, "waves lapping").with_mime_type(MOCK_IMAGE_MIME_TYPE));
        assert_eq!(asset.image_data_url(), format!("data:{MOCK_IMAGE_MIME_TYPE};base64,{MOCK_IMAGE}"));
        assert_eq!(mocks.image.requests(), vec![("a watercolor whale".to_string(), "1:1".to_string())]);
        assert!(mocks.backend.peek("book-asset-cache-MyBook-p1").await.is_some());
        assert_eq!(mocks.backend.writes(), 1);

        // Second resolution is served from the cache.
        assert_eq!(resolver.resolve(&book, &book.pages[0]).await.unwrap(), asset);
        assert_eq!(mocks.image.calls(), 1);
        assert_eq!(mocks.text.calls(), 1);
        assert_eq!(mocks.backend.writes(), 1);
    }

    #[tokio::test]
    async fn test_prepopulated_cache_needs_no_network() {
        let mut mocks = Mocks::new();
        mocks.backend = Arc::new(MockBackend::with_entries([(
            "book-asset-cache-MyBook-p1",
            r#"{"image":"cached","soundEffectPrompt":"gulls"}"#,
        )]));
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let asset = resolver.resolve(&book, &book.pages[0]).await.unwrap();
        assert_eq!(asset, PageAsset::new("cached", "gulls"));
        assert_eq!((mocks.text.calls(), mocks.image.calls()), (0, 0));
    }

    #[tokio::test]
    async fn test_upgrades_older_illustration_entries() {
        let mut mocks = Mocks::new();
        mocks.backend = Arc::new(MockBackend::with_entries([("book-illustration-cache-MyBook-p2", "b2xk")]));
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let asset = resolver.resolve(&book, &book.pages[1]).await.unwrap();
        assert_eq!(asset, PageAsset::new("b2xk", ""));
        assert_eq!((mocks.text.calls(), mocks.image.calls()), (0, 0));
        assert_eq!(
            mocks.backend.peek("book-asset-cache-MyBook-p2").await.as_deref(),
            Some(r#"{"image":"b2xk","soundEffectPrompt":""}"#)
        );
    }

    #[tokio::test]
    async fn test_blank_page_skips_generation() {
        let mocks = Mocks::new();
        let resolver = AssetResolver::new(mocks.context());
        let book = Book::new("MyBook", Cover::url("cover.png"), vec![Page::new(1, " \n ")], "blank");
        let asset = resolver.resolve(&book, &book.pages[0]).await.unwrap();
        assert_eq!(asset, PageAsset::new("", ""));
        assert_eq!((mocks.text.calls(), mocks.image.calls()), (0, 0));
        assert_eq!(mocks.backend.writes(), 0);
    }

    #[tokio::test]
    async fn test_direct_prompt_mode_skips_text_provider() {
        let mocks = Mocks::new();
        let mut config = Config::default();
        config.reader.prompt_mode = PromptMode::Direct;
        let resolver = AssetResolver::new(mocks.context_with(&config));
        let book = my_book();
        let asset = resolver.resolve(&book, &book.pages[0]).await.unwrap();
        assert_eq!(mocks.text.calls(), 0);
        let (prompt, _) = &mocks.image.requests()[0];
        assert!(prompt.contains("watercolor style") && prompt.ends_with("Text: \"Call me Ishmael.\""));
        assert!(asset.sound_effect_prompt.contains("Call me Ishmael."));
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_a_generation_failure() {
        let mut mocks = Mocks::new();
        mocks.text = Arc::new(MockTextProvider::new(r#"{"imagePrompt":"a whale"}"#));
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let err = resolver.resolve(&book, &book.pages[0]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::GenerationFailure(_)));
        assert_eq!(mocks.image.calls(), 0);
        assert_eq!(mocks.backend.writes(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mocks = Mocks::new();
        mocks.image.fail(true);
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let err = resolver.resolve(&book, &book.pages[0]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::GenerationFailure(_)));
        assert_eq!(mocks.backend.writes(), 0);

        mocks.image.fail(false);
        assert!(resolver.resolve(&book, &book.pages[0]).await.is_ok());
        assert_eq!(mocks.image.calls(), 2);
    }

    #[tokio::test]
    async fn test_storage_faults_do_not_fail_resolution() {
        let mocks = Mocks::new();
        mocks.backend.fail_reads(true);
        mocks.backend.fail_writes(true);
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        assert_eq!(resolver.resolve(&book, &book.pages[0]).await.unwrap().image, MOCK_IMAGE);
    }

    #[tokio::test]
    async fn test_sound_without_credentials() {
        let mut mocks = Mocks::new();
        mocks.sound = Arc::new(MockSoundProvider::unconfigured());
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let err = resolver.resolve_sound(&book, &book.pages[0], "waves").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ConfigurationError(_)));
        assert_eq!(mocks.sound.calls(), 0);
    }

    #[tokio::test]
    async fn test_cached_sound_skips_credential_check() {
        let mut mocks = Mocks::new();
        mocks.sound = Arc::new(MockSoundProvider::unconfigured());
        mocks.backend =
            Arc::new(MockBackend::with_entries([("book-sound-cache-MyBook-p1", "data:audio/mpeg;base64,SUQz")]));
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let clip = resolver.resolve_sound(&book, &book.pages[0], "").await.unwrap();
        assert_eq!(clip.data_url(), "data:audio/mpeg;base64,SUQz");
        assert_eq!(mocks.sound.calls(), 0);
    }

    #[tokio::test]
    async fn test_sound_is_generated_once() {
        let mocks = Mocks::new();
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let clip = resolver.resolve_sound(&book, &book.pages[0], "").await.unwrap();
        assert_eq!(clip.data_url(), "data:audio/mpeg;base64,SUQz");
        resolver.resolve_sound(&book, &book.pages[0], "").await.unwrap();
        assert_eq!(mocks.sound.calls(), 1);
        assert!(mocks.backend.peek("book-sound-cache-MyBook-p1").await.is_some());
    }

    #[tokio::test]
    async fn test_characters_are_cached_per_book() {
        let mut mocks = Mocks::new();
        mocks.text = Arc::new(MockTextProvider::new(r#"[{"name":"Ishmael","description":"A sailor"}]"#));
        let resolver = AssetResolver::new(mocks.context());
        let book = my_book();
        let characters = resolver.characters(&book).await.unwrap();
        assert_eq!(characters, vec![Character::new("Ishmael", "A sailor")]);
        assert_eq!(resolver.characters(&book).await.unwrap(), characters);
        assert_eq!(mocks.text.calls(), 1);
        assert!(mocks.backend.peek("book-character-cache-MyBook").await.is_some());
        assert!(mocks.text.prompts()[0].contains("Call me Ishmael.\n\nIt is a way I have."));
    }
}
