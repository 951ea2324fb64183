//! Current-page resolution with background prefetch of the next page.
//!
//! Every page has at most one outstanding resolution. A page being resolved
//! (in either path) is held in the in-flight set; a second request for it
//! waits on [`Notify`] until that resolution settles, then reuses its result
//! from the working set. If the resolution failed, the waiter claims the page
//! and resolves it itself.

use crate::error::Result;
use crate::resolve::AssetResolver;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storybook_extract::models::{Book, Page, PageAsset};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Default)]
struct State {
    /// Assets already obtained, by page number.
    working: HashMap<u32, PageAsset>,
    /// Page numbers with an outstanding resolution.
    in_flight: HashSet<u32>,
    /// Background prefetch tasks, by page number.
    tasks: HashMap<u32, JoinHandle<()>>,
}

struct Inner {
    resolver: AssetResolver,
    book: Arc<Book>,
    prefetch: bool,
    state: Mutex<State>,
    settled: Notify,
    loading: AtomicUsize,
}

/// Schedules page resolutions for one open book.
///
/// Cloning yields another handle onto the same working set.
#[derive(Clone)]
pub struct PrefetchScheduler {
    inner: Arc<Inner>,
}

/// Marks the scheduler as loading for as long as it lives.
struct Loading<'a>(&'a AtomicUsize);
impl<'a> Loading<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}
impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A page held in the in-flight set. Dropping the claim settles the page,
/// so a resolution that is cancelled midway releases it for the next request.
struct Claim<'a> {
    inner: &'a Inner,
    page_number: u32,
    asset: Option<PageAsset>,
}
impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.inner.settle(self.page_number, self.asset.take());
    }
}

impl PrefetchScheduler {
    /// `prefetch` toggles the background resolution of the next page.
    pub fn new(resolver: AssetResolver, book: Arc<Book>, prefetch: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver,
                book,
                prefetch,
                state: Mutex::new(State::default()),
                settled: Notify::new(),
                loading: AtomicUsize::new(0),
            }),
        }
    }

    pub fn book(&self) -> &Arc<Book> {
        &self.inner.book
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.inner.resolver
    }

    /// Resolves the page at `index`, starting a prefetch of `index + 1`
    /// without waiting for it.
    ///
    /// Returns `Ok(None)` when the book has no page at `index`.
    pub async fn on_page_change(&self, index: usize) -> Result<Option<PageAsset>> {
        let Some(page) = self.inner.book.page(index) else {
            return Ok(None);
        };
        let _loading = Loading::start(&self.inner.loading);
        if self.inner.prefetch {
            self.inner.spawn_prefetch(index + 1);
        }
        self.inner.obtain(page).await.map(Some)
    }

    /// Page numbers with an outstanding resolution, in ascending order.
    pub fn in_flight(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.inner.lock().in_flight.iter().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Waits for every background prefetch started so far to finish.
    pub async fn wait_idle(&self) {
        loop {
            let tasks: Vec<_> = self.inner.lock().tasks.drain().map(|(_, task)| task).collect();
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(err) = task.await {
                    warn!(error = %err, "Prefetch task did not complete");
                }
            }
        }
    }

    /// Whether a current-page resolution is underway.
    pub fn is_loading(&self) -> bool {
        self.inner.loading.load(Ordering::SeqCst) > 0
    }

    /// The asset for a page number, if this scheduler already obtained it.
    pub fn cached(&self, page_number: u32) -> Option<PageAsset> {
        self.inner.lock().working.get(&page_number).cloned()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_prefetch(self: &Arc<Self>, index: usize) {
        let Some(page) = self.book.page(index).cloned() else {
            return;
        };
        let page_number = page.page_number;
        let mut state = self.lock();
        if state.working.contains_key(&page_number) || !state.in_flight.insert(page_number) {
            return;
        }
        state.tasks.retain(|_, task| !task.is_finished());
        debug!(page = page_number, "Prefetching page");
        let inner = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut claim = Claim { inner: &inner, page_number, asset: None };
            match inner.resolver.resolve(&inner.book, &page).await {
                Ok(asset) => claim.asset = Some(asset),
                Err(err) => warn!(page = page_number, error = %err, "Dropped failed prefetch"),
            }
        });
        state.tasks.insert(page_number, task);
    }

    async fn obtain(&self, page: &Page) -> Result<PageAsset> {
        let page_number = page.page_number;
        loop {
            let settled = {
                let mut state = self.lock();
                if let Some(asset) = state.working.get(&page_number) {
                    return Ok(asset.clone());
                }
                if state.in_flight.insert(page_number) {
                    break;
                }
                // Registered before the lock is released, so a settle that
                // happens in between still wakes us.
                self.settled.notified()
            };
            debug!(page = page_number, "Waiting for in-flight resolution");
            settled.await;
        }
        let mut claim = Claim { inner: self, page_number, asset: None };
        let result = self.resolver.resolve(&self.book, page).await;
        claim.asset = result.as_ref().ok().cloned();
        result
    }

    fn settle(&self, page_number: u32, asset: Option<PageAsset>) {
        {
            let mut state = self.lock();
            state.in_flight.remove(&page_number);
            if let Some(asset) = asset {
                state.working.insert(page_number, asset);
            }
        }
        self.settled.notify_waiters();
    }
}
