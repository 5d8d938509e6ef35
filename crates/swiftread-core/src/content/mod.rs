//! Document content: word tokens, chapters, and the ingestion pipeline that
//! produces them.

pub mod decoder;
pub mod html;
mod html_entities;
mod markup;
pub mod pages;
pub mod structure;
pub mod word_stream;

use log::{debug, info};
use serde::{Deserialize, Serialize};

pub use decoder::{
    DecodeError, DecodedDocument, Decoder, DocumentFormat, NoNativeRendering, OutlineEntry,
    PlainTextDecoder, RenderCapabilities, Section, SectionLayout,
};
pub use pages::PageLine;
pub use structure::structure;
pub use word_stream::{build_word_stream, count_tokens};

/// Text carried by synthetic paragraph-break tokens.
pub const PARAGRAPH_BREAK_TEXT: &str = "\n";

/// Shown until a real document is loaded or restored.
pub const PLACEHOLDER_TEXT: &str = "Open a document to start reading.\n\
Words appear one at a time at a fixed focal point. \
Switch to the page view at any moment and the same position follows you.";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Word,
    /// First real word after a paragraph break; displayed longer.
    FirstAfterBreak,
    /// Synthetic blank token between paragraphs.
    ParagraphBreak,
}

/// One slot of the word stream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(text: &str, kind: TokenKind) -> Self {
        Self {
            text: text.to_owned(),
            kind,
        }
    }

    pub fn is_paragraph_break(&self) -> bool {
        self.kind == TokenKind::ParagraphBreak
    }

    pub fn is_first_after_break(&self) -> bool {
        self.kind == TokenKind::FirstAfterBreak
    }
}

/// Attachment point where a picture interrupts word-at-a-time playback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMarker {
    pub source_ref: String,
    pub alt_text: String,
    pub word_position: usize,
    /// `false` when the image bytes could not be resolved. Such markers are
    /// kept for position bookkeeping and never pause playback.
    pub available: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub level: u8,
    pub source_ref: String,
    pub raw_text: String,
    /// Index-tagged markup for the page view, regenerated from `raw_text`.
    #[serde(skip)]
    pub renderable_content: String,
    pub start_word_index: usize,
    pub end_word_index: usize,
    pub word_count: usize,
    #[serde(default)]
    pub images: Vec<ImageMarker>,
}

impl Chapter {
    pub fn contains(&self, word_index: usize) -> bool {
        (self.start_word_index..self.end_word_index).contains(&word_index)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub id: String,
    pub title: String,
    pub level: u8,
    pub chapter_index: usize,
    pub start_word_index: usize,
    pub word_count: usize,
    #[serde(default)]
    pub preview: String,
}

/// Chapters and table of contents over one global word index space.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStructure {
    pub chapters: Vec<Chapter>,
    pub toc: Vec<TocEntry>,
    pub has_native_structure: bool,
}

impl DocumentStructure {
    /// Single-chapter structure for a plain text document.
    pub fn plain(text: &str) -> Self {
        structure::finalize(
            vec![structure::ChapterDraft::new(
                "Document".into(),
                0,
                String::new(),
                text.to_owned(),
            )],
            false,
        )
    }

    pub fn total_words(&self) -> usize {
        self.chapters.last().map_or(0, |chapter| chapter.end_word_index)
    }

    /// Global token stream: per-chapter streams laid end to end.
    pub fn word_stream(&self) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(self.total_words());
        for chapter in &self.chapters {
            let start = tokens.len();
            tokens.extend(build_word_stream(&chapter.raw_text));
            if start > 0
                && let Some(first) = tokens.get_mut(start)
                && first.kind == TokenKind::Word
            {
                first.kind = TokenKind::FirstAfterBreak;
            }
        }
        tokens
    }

    /// Image marker at `word_index` that is allowed to pause playback.
    pub fn available_image_at(&self, word_index: usize) -> Option<&ImageMarker> {
        self.images().find(|image| image.available && image.word_position == word_index)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageMarker> {
        self.chapters.iter().flat_map(|chapter| chapter.images.iter())
    }

    /// Rebuild the fields that are never persisted.
    pub fn rehydrate(&mut self) {
        for chapter in &mut self.chapters {
            chapter.renderable_content =
                markup::render_chapter_markup(&chapter.raw_text, chapter.start_word_index);
        }
    }

    /// Check that chapter intervals partition `[0, total)` and agree with the
    /// chapter text they were derived from.
    pub fn validate(&self) -> bool {
        let mut expected_start = 0usize;
        for chapter in &self.chapters {
            if chapter.start_word_index != expected_start
                || chapter.end_word_index < chapter.start_word_index
                || chapter.word_count != chapter.end_word_index - chapter.start_word_index
                || chapter.word_count != count_tokens(&chapter.raw_text)
            {
                return false;
            }
            expected_start = chapter.end_word_index;
        }
        self.toc.len() == self.chapters.len()
    }
}

/// Where a loaded document's text came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentSource {
    PlainText,
    Structured,
}

/// A document ready for playback.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub text: String,
    pub words: Vec<Token>,
    pub structure: DocumentStructure,
    pub source: DocumentSource,
    /// Host renderer can show this format natively; position data is produced
    /// either way.
    pub renders_natively: bool,
}

impl Document {
    pub fn plain(text: &str) -> Self {
        let structure = DocumentStructure::plain(text);
        let words = structure.word_stream();
        Self {
            text: text.to_owned(),
            words,
            structure,
            source: DocumentSource::PlainText,
            renders_natively: false,
        }
    }

    pub fn placeholder() -> Self {
        Self::plain(PLACEHOLDER_TEXT)
    }

    /// Wrap a finished structure. Call [`DocumentStructure::rehydrate`] first
    /// when the structure came back from storage.
    pub fn from_structure(structure: DocumentStructure) -> Self {
        let words = structure.word_stream();
        let text = structure
            .chapters
            .iter()
            .map(|chapter| chapter.raw_text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            text,
            words,
            structure,
            source: DocumentSource::Structured,
            renders_natively: false,
        }
    }

    pub fn total_words(&self) -> usize {
        self.words.len()
    }
}

/// Typed ingestion failure surfaced to the caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IngestionError {
    Decode(DecodeError),
    /// The decoder ran but produced no sections at all.
    NoSections,
}

impl core::fmt::Display for IngestionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "could not decode document: {err}"),
            Self::NoSections => f.write_str("document contains no readable sections"),
        }
    }
}

impl std::error::Error for IngestionError {}

impl From<DecodeError> for IngestionError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

/// Decode `bytes` and structure the result into a playable document.
///
/// Empty but decodable content yields an empty, valid document.
pub async fn load_document<D, C>(
    bytes: &[u8],
    decoder: &D,
    capabilities: &C,
) -> Result<Document, IngestionError>
where
    D: Decoder,
    C: RenderCapabilities,
{
    let decoded = decoder.decode(bytes).await?;
    if decoded.sections.is_empty() {
        return Err(IngestionError::NoSections);
    }

    let format = decoded.format;
    let mut document = match (format, decoded.sections.as_slice()) {
        (DocumentFormat::PlainText, [only]) => Document::plain(&only.text),
        _ => {
            let built = structure(
                &decoded.sections,
                decoded.outline.as_deref(),
                &decoded.assets,
                decoded.layout,
            );
            debug!(
                "ingest: structured sections={} chapters={} native_structure={}",
                decoded.sections.len(),
                built.chapters.len(),
                built.has_native_structure
            );
            Document::from_structure(built)
        }
    };
    document.renders_natively = capabilities.renders_natively(format);
    info!(
        "ingest: loaded format={:?} words={} chapters={} native_render={}",
        format,
        document.total_words(),
        document.structure.chapters.len(),
        document.renders_natively
    );
    Ok(document)
}
