//! A reading session over one book.

use crate::context::Context;
use crate::error::Result;
use crate::pager::{Controls, Direction, Pager};
use crate::prefetch::PrefetchScheduler;
use crate::resolve::AssetResolver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use storybook_extract::models::{Book, Character, Page, PageAsset, SoundClip};
use tracing::{debug, info};

/// What the current page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    Loading,
    Ready(PageAsset),
    /// Resolution failed; holds a message fit for display.
    Failed(String),
    /// The book has no pages.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub index: usize,
    pub page: Option<Page>,
    pub status: PageStatus,
}

/// Bundles a book with its pager and prefetch scheduler.
///
/// Navigation methods return `None` when the request was refused (a turn is
/// already in progress, or there is no page in that direction) and when the
/// page was left before its asset arrived. Such late assets still land in the
/// cache and the working set, they are just not shown.
pub struct Reader {
    book: Arc<Book>,
    pager: Mutex<Pager>,
    scheduler: PrefetchScheduler,
    transition: Duration,
    status: Mutex<PageStatus>,
}
impl Reader {
    pub fn new(ctx: &Context, book: Arc<Book>) -> Self {
        let scheduler = PrefetchScheduler::new(AssetResolver::new(ctx.clone()), book.clone(), ctx.prefetch);
        let status = if book.is_empty() { PageStatus::Empty } else { PageStatus::Loading };
        Self {
            pager: Mutex::new(Pager::new(book.len())),
            book,
            scheduler,
            transition: ctx.transition,
            status: Mutex::new(status),
        }
    }

    pub fn book(&self) -> &Arc<Book> {
        &self.book
    }

    pub fn scheduler(&self) -> &PrefetchScheduler {
        &self.scheduler
    }

    /// Shows the current page (the first, for a new reader).
    pub async fn open(&self) -> Option<Result<PageAsset>> {
        info!(title = %self.book.title, pages = self.book.len(), "Opening book");
        let index = self.pager().index();
        self.show(index).await
    }

    /// Turns one page, holding the transition for its full duration before
    /// resolving the new page.
    ///
    /// If the returned future is dropped mid-transition, the turn still
    /// lands and the new page is left loading.
    pub async fn change_page(&self, direction: Direction) -> Option<Result<PageAsset>> {
        let target = self.pager().begin(direction)?;
        let turn = Turn(Some(self));
        debug!(%direction, target, "Turning page");
        tokio::time::sleep(self.transition).await;
        let index = turn.complete()?;
        self.show(index).await
    }

    /// Moves straight to `index`, for restoring a reading position.
    pub async fn jump_to(&self, index: usize) -> Option<Result<PageAsset>> {
        if !self.pager().jump_to(index) {
            return None;
        }
        self.show(index).await
    }

    pub fn view(&self) -> PageView {
        let index = self.pager().index();
        PageView { index, page: self.book.page(index).cloned(), status: self.status().clone() }
    }

    pub fn controls(&self) -> Controls {
        self.pager().controls()
    }

    pub fn is_loading(&self) -> bool {
        self.scheduler.is_loading()
    }

    /// The sound effect for the current page, using its derived sound prompt
    /// when one is known. `None` for an empty book.
    pub async fn sound(&self) -> Result<Option<SoundClip>> {
        let Some(page) = self.book.page(self.pager().index()).cloned() else {
            return Ok(None);
        };
        let prompt = self.scheduler.cached(page.page_number).map(|asset| asset.sound_effect_prompt).unwrap_or_default();
        self.scheduler.resolver().resolve_sound(&self.book, &page, &prompt).await.map(Some)
    }

    pub async fn characters(&self) -> Result<Vec<Character>> {
        self.scheduler.resolver().characters(&self.book).await
    }

    async fn show(&self, index: usize) -> Option<Result<PageAsset>> {
        if !self.book.is_empty() {
            *self.status() = PageStatus::Loading;
        }
        let result = self.scheduler.on_page_change(index).await;
        if self.pager().index() != index {
            debug!(index, "Discarding asset for a page no longer shown");
            return None;
        }
        let (status, result) = match result {
            Ok(Some(asset)) => (PageStatus::Ready(asset.clone()), Some(Ok(asset))),
            Ok(None) => (PageStatus::Empty, None),
            Err(err) => (PageStatus::Failed(err.user_message()), Some(Err(err))),
        };
        *self.status() = status;
        result
    }

    fn pager(&self) -> MutexGuard<'_, Pager> {
        self.pager.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn status(&self) -> MutexGuard<'_, PageStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A page turn begun on the pager. Dropping it unfinished completes the turn.
struct Turn<'a>(Option<&'a Reader>);
impl Turn<'_> {
    fn complete(mut self) -> Option<usize> {
        self.0.take()?.pager().complete()
    }
}
impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let Some(reader) = self.0.take() else {
            return;
        };
        if let Some(index) = reader.pager().complete() {
            debug!(index, "Turn interrupted, landing without resolving");
            *reader.status() = PageStatus::Loading;
        }
    }
}
