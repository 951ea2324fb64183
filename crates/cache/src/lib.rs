//! Persistent per-page asset cache.
//!
//! Generated assets are expensive, so every successful generation is kept in
//! durable key-value storage and looked up before any provider is called.
//!
//! # Layout
//! Keys are `<namespace prefix><book segment>[-p<page>]`, for example
//! `book-asset-cache-MyBook-p1`. The book segment is the sanitized title by
//! default, or the book fingerprint (see [`KeyStrategy`]).
//!
//! The cache never fails: see [`CacheStore`].

pub mod error;
mod key;
mod store;
mod value;

pub use crate::key::{KeyStrategy, Namespace, sanitize};
pub use crate::store::CacheStore;
pub use crate::value::CacheValue;
