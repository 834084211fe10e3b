//! Emoji catalog.
//!
//! Built from the `emoji-data` JSON dump. Only emojis with a Twemoji image
//! are kept, since that is what the front end renders.

use std::path::Path;

use reactions_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct RawEmoji {
    unified: String,
    short_name: String,
    #[serde(default)]
    has_img_twitter: bool,
}

/// A pickable emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Emoji {
    /// First code point, as used in reaction configs (`0x1F602`).
    pub id: String,
    /// Short name (`joy`).
    pub name: String,
}

/// The emojis offered when configuring reactions.
#[derive(Debug, Clone, Default)]
pub struct EmojiCatalog {
    emojis: Vec<Emoji>,
}

impl EmojiCatalog {
    /// Parse an `emoji-data` JSON document.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let raw: Vec<RawEmoji> = serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid emoji data: {e}")))?;

        let emojis = raw
            .into_iter()
            .filter(|e| e.has_img_twitter)
            .filter_map(|e| {
                let first = e.unified.split('-').next()?.trim();
                if first.is_empty() {
                    return None;
                }
                Some(Emoji {
                    id: format!("0x{first}"),
                    name: e.short_name,
                })
            })
            .collect();

        Ok(Self { emojis })
    }

    /// Read and parse an `emoji-data` JSON file.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read emoji data {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), count = catalog.len(), "Loaded emoji catalog");
        Ok(catalog)
    }

    /// Look up an emoji by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id.eq_ignore_ascii_case(id))
    }

    #[must_use]
    pub fn all(&self) -> &[Emoji] {
        &self.emojis
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }
}
