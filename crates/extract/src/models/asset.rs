use serde::{Deserialize, Serialize};

/// Assumed for illustrations cached without a MIME type.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Generated content for one page.
///
/// Created on the first successful generation for a page, then cached
/// indefinitely. Never mutated: a regenerated asset replaces the old one
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAsset {
    /// Base64-encoded illustration bytes (no data URL prefix)
    pub image: String,
    /// Prompt describing ambient sound effects for the page
    #[serde(default)]
    pub sound_effect_prompt: String,
    /// MIME type reported by the image provider, absent from older entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}
impl PageAsset {
    pub fn new(image: impl Into<String>, sound_effect_prompt: impl Into<String>) -> Self {
        Self { image: image.into(), sound_effect_prompt: sound_effect_prompt.into(), mime_type: None }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// The illustration as a displayable data URL.
    pub fn image_data_url(&self) -> String {
        let mime_type = self.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME_TYPE);
        format!("data:{mime_type};base64,{}", self.image)
    }
}

/// A generated sound effect, held as an audio data URL
/// (`data:audio/mpeg;base64,...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoundClip(pub String);
impl SoundClip {
    pub fn data_url(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_asset_json_layout() {
        let asset = PageAsset::new("AAAA", "waves lapping");
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, r#"{"image":"AAAA","soundEffectPrompt":"waves lapping"}"#);
        assert_eq!(serde_json::from_str::<PageAsset>(&json).unwrap(), asset);
    }

    #[test]
    fn test_page_asset_missing_sound_prompt() {
        let asset: PageAsset = serde_json::from_str(r#"{"image":"AAAA"}"#).unwrap();
        assert_eq!(asset.sound_effect_prompt, "");
    }

    #[test]
    fn test_image_data_url() {
        let asset = PageAsset::new("AAAA", "");
        assert_eq!(asset.image_data_url(), "data:image/jpeg;base64,AAAA");
        let asset = asset.with_mime_type("image/png");
        assert_eq!(asset.image_data_url(), "data:image/png;base64,AAAA");
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, r#"{"image":"AAAA","soundEffectPrompt":"","mimeType":"image/png"}"#);
    }
}
