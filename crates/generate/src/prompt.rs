//! Prompt templating.
//!
//! Every prompt sent to a provider is rendered from a user-configurable
//! [upon] template. Templates are compiled eagerly when [`Prompts`] is built,
//! so a broken template fails at startup instead of on the first page turn.
//!
//! # Template Variables
//!
//! | Variable | Type     | Available in                              |
//! |----------|----------|-------------------------------------------|
//! | `title`  | `String` | all templates                             |
//! | `text`   | `String` | page text, or whole book text for `characters` |
//! | `page`   | `u32`    | `illustration`, `sound`, `scene`          |
//!
//! The `truncate` function cuts a string to a maximum byte length at a
//! character boundary: `{{ truncate(text, 400) }}` or `{{ text|truncate: 400 }}`.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use upon::{Engine, Template};

const ILLUSTRATION: &str = "Create a simple, elegant, minimalist, and kid-friendly illustration for the following \
    text from a story book. The illustration should be in a watercolor style, centered on a white background. \
    Text: \"{{ text }}\"";
const SOUND: &str = "Soft ambient sound effects for this moment in a story: {{ truncate(text, 400) }}";
const SCENE: &str = "You are illustrating page {{ page }} of the storybook \"{{ title }}\". Describe a simple, \
    elegant, kid-friendly watercolor illustration of the scene as imagePrompt, and the ambient sound effects a \
    listener would hear in the scene as soundEffectPrompt. Page text: \"{{ text }}\"";
const CHARACTERS: &str = "List the main characters of the book \"{{ title }}\", each with a one-sentence visual \
    description suitable for keeping illustrations consistent.\n\n{{ truncate(text, 30000) }}";
const COVER: &str =
    "A beautiful and compelling book cover for a story titled \"{{ title }}\". Style: minimalist, elegant, evocative.";

/// How page prompts are produced before an illustration is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Ask the text provider to derive image and sound prompts from the page.
    #[default]
    Derived,
    /// Render the illustration and sound templates directly from the page text.
    Direct,
}

/// Template sources, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub illustration: String,
    pub sound: String,
    pub scene: String,
    pub characters: String,
    pub cover: String,
}
impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            illustration: ILLUSTRATION.to_string(),
            sound: SOUND.to_string(),
            scene: SCENE.to_string(),
            characters: CHARACTERS.to_string(),
            cover: COVER.to_string(),
        }
    }
}

/// Compiled prompt templates.
pub struct Prompts {
    engine: Engine<'static>,
    illustration: Template<'static>,
    sound: Template<'static>,
    scene: Template<'static>,
    characters: Template<'static>,
    cover: Template<'static>,
}
impl Prompts {
    /// Compiles every template. Returns [`ErrorKind::Template`] on the first
    /// syntax error.
    pub fn new(templates: &PromptTemplates) -> Result<Self> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let compile = |source: &str| engine.compile(source.to_string()).or_raise(|| ErrorKind::Template);
        Ok(Self {
            illustration: compile(&templates.illustration)?,
            sound: compile(&templates.sound)?,
            scene: compile(&templates.scene)?,
            characters: compile(&templates.characters)?,
            cover: compile(&templates.cover)?,
            engine,
        })
    }

    pub fn illustration(&self, title: &str, page: u32, text: &str) -> Result<String> {
        self.render(&self.illustration, upon::value! { title: title, page: page, text: text })
    }

    pub fn sound(&self, title: &str, page: u32, text: &str) -> Result<String> {
        self.render(&self.sound, upon::value! { title: title, page: page, text: text })
    }

    pub fn scene(&self, title: &str, page: u32, text: &str) -> Result<String> {
        self.render(&self.scene, upon::value! { title: title, page: page, text: text })
    }

    pub fn characters(&self, title: &str, text: &str) -> Result<String> {
        self.render(&self.characters, upon::value! { title: title, text: text })
    }

    pub fn cover(&self, title: &str) -> Result<String> {
        self.render(&self.cover, upon::value! { title: title })
    }

    fn render(&self, template: &Template<'static>, parameters: upon::Value) -> Result<String> {
        let rendered = template.render(&self.engine, parameters).to_string().or_raise(|| ErrorKind::Template)?;
        Ok(rendered.trim().to_string())
    }
}

/// Custom [`upon`] extensions for prompt text.
mod addons {
    use upon::Engine;

    /// Truncates a string to a maximum byte length at a character boundary.
    fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> String {
        s[..s.floor_char_boundary(max_bytes)].to_string()
    }

    /// Registers the `truncate` function on the given engine.
    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_function("truncate", truncate_to_char_boundary);
    }
}
