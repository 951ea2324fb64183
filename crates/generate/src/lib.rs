//! Generative providers for storybook assets.
//!
//! - [`provider`]: the text, image and sound provider traits, their HTTP
//!   clients, and (behind the `mock` feature) in-memory test doubles.
//! - [`decode`]: strict decoding of structured text replies.
//! - [`prompt`]: user-configurable prompt templates.
//!
//! Nothing here caches or retries; callers decide what to do with a failure
//! (see [`ErrorKind::is_retryable`](error::ErrorKind::is_retryable)).

pub mod decode;
pub mod error;
pub mod prompt;
pub mod provider;

pub use crate::prompt::{PromptMode, PromptTemplates, Prompts};
pub use crate::provider::{
    GeneratedImage, ImageHandle, ImageProvider, SoundHandle, SoundProvider, TextHandle, TextProvider,
};
