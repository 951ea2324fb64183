//! Storybook core.
//!
//! Books are shelved in a [`Library`], either built in or ingested from an
//! uploaded PDF. A [`Reader`] turns the pages of one book; every page gets an
//! illustration and a sound prompt from the generative providers, resolved
//! through the persistent asset cache so each is generated at most once, with
//! the next page prefetched in the background.
//!
//! All collaborators (cache backend, providers, document parser) are bundled
//! in a [`Context`] and injected, so every operation can run against mocks.

mod context;
pub mod error;
mod ingest;
mod library;
pub mod pager;
mod prefetch;
mod reader;
mod resolve;

pub use crate::context::{Context, Providers};
pub use crate::ingest::ingest;
pub use crate::library::Library;
pub use crate::pager::{Controls, Direction, Pager, PagerState};
pub use crate::prefetch::PrefetchScheduler;
pub use crate::reader::{PageStatus, PageView, Reader};
pub use crate::resolve::AssetResolver;
