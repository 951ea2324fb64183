//! Durable key-value storage for storybook caches.
//!
//! Every cache entry is a string value stored under a flat, human-readable
//! key. Backends only know about keys and values; namespacing and encoding
//! belong to the cache layer above.

pub mod backend;
pub mod error;
mod key;
mod models;

pub use crate::backend::StorageBackend;
pub use crate::key::validate as validate_key;
pub use crate::models::Entry;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
