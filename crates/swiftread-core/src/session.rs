//! Persisted reading session.

use serde::{Deserialize, Serialize};

use crate::{content::DocumentStructure, settings::Settings};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    #[default]
    WordAtATime,
    Paginated,
}

/// Everything needed to put the reader back where it was.
///
/// `current_chapter_index` and `scroll_percentage` are cached conveniences;
/// `current_word_index` stays authoritative on restore.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub document_text: String,
    pub current_word_index: usize,
    pub total_words: usize,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub current_chapter_index: usize,
    #[serde(default)]
    pub scroll_percentage: f32,
    #[serde(default)]
    pub document_structure: Option<DocumentStructure>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, rename = "savedAtTimestamp")]
    pub saved_at_ms: u64,
}

impl Session {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Document;

    fn sample() -> Session {
        let document = Document::plain("one two\nthree");
        Session {
            document_text: document.text.clone(),
            current_word_index: 3,
            total_words: document.total_words(),
            view_mode: ViewMode::Paginated,
            current_chapter_index: 0,
            scroll_percentage: 75.0,
            document_structure: Some(document.structure),
            settings: Settings::default(),
            saved_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn stored_form_uses_camel_case_and_omits_markup() {
        let json = sample().to_json().unwrap();

        assert!(json.contains("\"currentWordIndex\":3"));
        assert!(json.contains("\"viewMode\":\"paginated\""));
        assert!(json.contains("\"savedAtTimestamp\":1700000000000"));
        assert!(json.contains("\"rawText\""));
        assert!(!json.contains("renderableContent"));
        assert!(!json.contains("data-word"));
    }

    #[test]
    fn minimal_payload_fills_defaults() {
        let session = Session::from_json(
            r#"{"documentText":"hi there","currentWordIndex":1,"totalWords":2}"#,
        )
        .unwrap();

        assert_eq!(session.view_mode, ViewMode::WordAtATime);
        assert_eq!(session.settings, Settings::default());
        assert!(session.document_structure.is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Session::from_json("{\"documentText\":").is_err());
        assert!(Session::from_json("[]").is_err());
    }
}
