//! Turning uploaded documents into books.

use crate::context::Context;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use storybook_config::CoverFailure;
use storybook_extract::Document;
use storybook_extract::models::{Book, Cover};
use storybook_generate::GeneratedImage;
use storybook_generate::error::Result as GenerateResult;
use tracing::{info, instrument, warn};

const COVER_ASPECT_RATIO: &str = "3:4";

/// Builds a [`Book`] from an uploaded document.
///
/// The format is checked before anything is parsed. Page extraction runs on
/// a blocking thread. A cover is generated when enabled; what happens when
/// that fails is decided by [`CoverFailure`].
///
/// Nothing is cached: ingesting the same document twice yields two books with
/// identical pages.
#[instrument(skip_all, fields(file_name = %document.file_name, size = document.bytes.len()))]
pub async fn ingest(ctx: &Context, document: Document) -> Result<Book> {
    document.format().map_err(ErrorKind::extraction)?;
    let title = document.title();
    let fingerprint = document.fingerprint();

    let file_name = document.file_name.clone();
    let parser = ctx.parser.clone();
    let pages = tokio::task::spawn_blocking(move || storybook_extract::extract(parser.as_ref(), &document))
        .await
        .or_raise(|| ErrorKind::ParseFailure(file_name.clone()))?
        .map_err(ErrorKind::extraction)?;

    let cover = cover(ctx, &title).await?;
    let book = Book::new(title, cover, pages, fingerprint);
    info!(title = %book.title, pages = book.len(), words = book.word_count(), "Ingested book");
    Ok(book)
}

async fn cover(ctx: &Context, title: &str) -> Result<Cover> {
    let placeholder = || Cover::url(&ctx.ingest.placeholder_cover);
    if !ctx.ingest.generate_cover {
        return Ok(placeholder());
    }
    match generate_cover(ctx, title).await {
        Ok(image) => Ok(Cover::Generated { mime_type: image.mime_type, base64: image.base64 }),
        Err(err) => match ctx.ingest.cover_failure {
            CoverFailure::Placeholder => {
                warn!(error = %err, "Cover generation failed, using placeholder");
                Ok(placeholder())
            },
            CoverFailure::Abort => Err(ErrorKind::generation(err)),
        },
    }
}

async fn generate_cover(ctx: &Context, title: &str) -> GenerateResult<GeneratedImage> {
    let prompt = ctx.prompts.cover(title)?;
    ctx.providers.image.generate_image(&prompt, COVER_ASPECT_RATIO).await
}
