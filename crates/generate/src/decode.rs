//! Strict decoding of structured provider replies.
//!
//! Text providers are asked to answer with JSON matching a declared schema,
//! but nothing guarantees they do. Every reply goes through [`decode`], which
//! either produces the typed value or fails with
//! [`ErrorKind::SchemaMismatch`]. Unknown and missing fields are both
//! rejected; nothing is guessed.

use crate::error::{ErrorKind, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use storybook_extract::models::Character;

/// Prompts derived from one page of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenePrompts {
    pub image_prompt: String,
    pub sound_effect_prompt: String,
}
impl ScenePrompts {
    /// Response schema sent alongside the scene prompt.
    pub fn schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "imagePrompt": { "type": "STRING" },
                "soundEffectPrompt": { "type": "STRING" },
            },
            "required": ["imagePrompt", "soundEffectPrompt"],
        })
    }
}

/// Response schema for whole-book character analysis.
pub fn characters_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "description": { "type": "STRING" },
            },
            "required": ["name", "description"],
        },
    })
}

/// Parses raw provider output into `T`, rejecting anything that does not fit.
///
/// ```
/// use storybook_generate::decode::{ScenePrompts, decode};
///
/// let ok: ScenePrompts = decode(r#"{"imagePrompt":"a whale","soundEffectPrompt":"waves"}"#).unwrap();
/// assert_eq!(ok.image_prompt, "a whale");
///
/// assert!(decode::<ScenePrompts>(r#"{"imagePrompt":"a whale"}"#).is_err());
/// assert!(decode::<ScenePrompts>("Sure! Here is your JSON").is_err());
/// ```
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw.trim()).map_err(|err| exn::Exn::from(ErrorKind::SchemaMismatch(err.to_string())))
}

/// Decodes scene prompts, additionally rejecting a blank image prompt.
pub fn scene_prompts(raw: &str) -> Result<ScenePrompts> {
    let prompts: ScenePrompts = decode(raw)?;
    if prompts.image_prompt.trim().is_empty() {
        exn::bail!(ErrorKind::SchemaMismatch("imagePrompt is empty".to_string()));
    }
    Ok(prompts)
}

/// Decodes a character list, dropping entries without a name.
pub fn characters(raw: &str) -> Result<Vec<Character>> {
    let characters: Vec<Character> = decode(raw)?;
    Ok(characters.into_iter().filter(|c| !c.name.trim().is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("null")]
    #[case("[]")]
    #[case(r#"{"imagePrompt":"a whale"}"#)]
    #[case(r#"{"imagePrompt":"a whale","soundEffectPrompt":"waves","mood":"calm"}"#)]
    #[case(r#"{"imagePrompt":42,"soundEffectPrompt":"waves"}"#)]
    #[case(r#"{"imagePrompt":"   ","soundEffectPrompt":"waves"}"#)]
    #[case("```json\n{\"imagePrompt\":\"a whale\",\"soundEffectPrompt\":\"waves\"}\n```")]
    fn test_scene_prompts_rejects(#[case] raw: &str) {
        let err = scene_prompts(raw).unwrap_err();
        assert!(matches!(&*err, ErrorKind::SchemaMismatch(_)));
    }

    #[test]
    fn test_scene_prompts_accepts_surrounding_whitespace() {
        let prompts = scene_prompts("\n {\"soundEffectPrompt\":\"gulls\",\"imagePrompt\":\"a harbour\"} \n").unwrap();
        assert_eq!(prompts, ScenePrompts { image_prompt: "a harbour".into(), sound_effect_prompt: "gulls".into() });
    }

    #[test]
    fn test_characters() {
        let raw = r#"[{"name":"Ishmael","description":"The narrator"},{"name":" ","description":"?"}]"#;
        assert_eq!(characters(raw).unwrap(), vec![Character::new("Ishmael", "The narrator")]);
        assert!(characters(r#"{"name":"Ishmael","description":"The narrator"}"#).is_err());
        assert!(characters(r#"[{"name":"Ishmael","description":"x","age":30}]"#).is_err());
    }

    #[test]
    fn test_schemas_require_every_field() {
        assert_eq!(ScenePrompts::schema()["required"], json!(["imagePrompt", "soundEffectPrompt"]));
        assert_eq!(characters_schema()["items"]["required"], json!(["name", "description"]));
    }
}
