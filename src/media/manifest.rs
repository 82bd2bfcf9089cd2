use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Parsed `config.json` of a collection directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Advisory; no migrations exist yet.
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub videos: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub name: String,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The declared title, or a title derived from the directory id when the
    /// manifest has none (or an empty one).
    pub fn display_title(&self, id: &str) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => title_from_id(id),
        }
    }
}

/// `summer_trip-2024` -> `Summer Trip 2024`.
///
/// Separators become spaces and the first character of every word is
/// upper-cased; the rest of each word is left alone.
pub fn title_from_id(id: &str) -> String {
    let mut title = String::with_capacity(id.len());
    let mut in_word = false;
    for c in id.chars() {
        let c = if c == '-' || c == '_' { ' ' } else { c };
        let is_word = c.is_ascii_alphanumeric();
        if is_word && !in_word {
            title.push(c.to_ascii_uppercase());
        } else {
            title.push(c);
        }
        in_word = is_word;
    }
    title
}
