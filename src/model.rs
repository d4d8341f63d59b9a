use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CardError, CardResult};

/// Template variant used when an entry's artwork map has no match for the
/// requested template.
pub const DEFAULT_TEMPLATE: &str = "cartoon";

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WordLibrary {
    pub id: String,
    pub name: String,
    pub words: Vec<WordEntry>,
}

/// One entry of the word library. Immutable once loaded; the rendering
/// pipeline never writes back into it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WordEntry {
    pub id: String,
    pub english: String,
    pub localized: String,
    pub artwork: ArtworkRef,
    pub anchor: OverlayAnchor,
}

/// Card artwork reference: either one image for all templates or a
/// template-variant map.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ArtworkRef {
    Single(String),
    Variants(BTreeMap<String, String>),
}

impl ArtworkRef {
    /// Resolve the artwork source for a template. For a variant map the
    /// requested template wins, then the `cartoon` variant. `None` means the
    /// caller falls back to the placeholder asset.
    pub fn resolve(&self, template: &str) -> Option<&str> {
        match self {
            ArtworkRef::Single(url) => Some(url.as_str()),
            ArtworkRef::Variants(map) => map
                .get(template)
                .or_else(|| map.get(DEFAULT_TEMPLATE))
                .map(String::as_str),
        }
    }
}

/// Default overlay placement for a word, in percent of the card's square
/// photo area. `x`/`y` locate the overlay square's top-left corner.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct OverlayAnchor {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    #[serde(default)]
    pub rotation: f64,
}

impl WordLibrary {
    pub fn validate(&self) -> CardResult<()> {
        if self.words.is_empty() {
            return Err(CardError::validation(format!(
                "library '{}' has no words",
                self.id
            )));
        }

        let mut seen = BTreeSet::new();
        for word in &self.words {
            if word.id.trim().is_empty() {
                return Err(CardError::validation("word id must be non-empty"));
            }
            if !seen.insert(word.id.as_str()) {
                return Err(CardError::validation(format!(
                    "duplicate word id '{}'",
                    word.id
                )));
            }
            if word.english.trim().is_empty() {
                return Err(CardError::validation(format!(
                    "word '{}' has empty english text",
                    word.id
                )));
            }
            word.anchor.validate(&word.id)?;
        }
        Ok(())
    }
}

impl OverlayAnchor {
    fn validate(&self, word_id: &str) -> CardResult<()> {
        let in_percent = |v: f64| (0.0..=100.0).contains(&v);
        if !in_percent(self.x) || !in_percent(self.y) || !in_percent(self.width) {
            return Err(CardError::validation(format!(
                "word '{}' anchor out of percent range",
                word_id
            )));
        }
        if !self.rotation.is_finite() {
            return Err(CardError::validation(format!(
                "word '{}' anchor rotation must be finite",
                word_id
            )));
        }
        Ok(())
    }
}
