//! Boundary with format decoders and host renderers.
//!
//! Decoders only turn file bytes into per-section text or markup plus an
//! outline. Word counts, chapter boundaries and timing are computed by the
//! core from what they return.

use super::pages::PageLine;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentFormat {
    PlainText,
    Html,
    Epub,
    Pdf,
}

/// How decoder sections relate to the document's logical structure.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SectionLayout {
    /// One section per content document (EPUB spine item, HTML file).
    #[default]
    Logical,
    /// One section per page, as page-oriented formats expose text.
    Paged,
}

/// Raw content of one decoder section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section {
    pub text: String,
    /// Section markup; when present it takes precedence over `text`.
    pub html: Option<String>,
    /// Positioned lines of a page; paragraphs are recovered from their
    /// spacing. Used when there is no markup.
    pub lines: Option<Vec<PageLine>>,
    pub source_ref: String,
}

impl Section {
    pub fn text(source_ref: &str, text: &str) -> Self {
        Self {
            text: text.to_owned(),
            html: None,
            lines: None,
            source_ref: source_ref.to_owned(),
        }
    }

    pub fn page_lines(source_ref: &str, lines: Vec<PageLine>) -> Self {
        Self {
            text: String::new(),
            html: None,
            lines: Some(lines),
            source_ref: source_ref.to_owned(),
        }
    }

    pub fn html(source_ref: &str, html: &str) -> Self {
        Self {
            text: String::new(),
            html: Some(html.to_owned()),
            lines: None,
            source_ref: source_ref.to_owned(),
        }
    }
}

/// Native table-of-contents node.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutlineEntry {
    pub title: String,
    pub destination_ref: String,
    pub children: Vec<OutlineEntry>,
}

impl OutlineEntry {
    pub fn new(title: &str, destination_ref: &str) -> Self {
        Self {
            title: title.to_owned(),
            destination_ref: destination_ref.to_owned(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineEntry>) -> Self {
        self.children = children;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedDocument {
    pub format: DocumentFormat,
    pub sections: Vec<Section>,
    pub outline: Option<Vec<OutlineEntry>>,
    /// Resource paths the decoder can serve bytes for (images, mostly).
    pub assets: Vec<String>,
    pub layout: SectionLayout,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeError {
    UnsupportedFormat,
    Corrupt(String),
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedFormat => f.write_str("unsupported file format"),
            Self::Corrupt(reason) => write!(f, "corrupt file: {reason}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Format-specific byte parser.
#[allow(async_fn_in_trait)]
pub trait Decoder {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, DecodeError>;
}

/// Host capability query: can the platform show this format with its own
/// viewer? The answer is recorded on the loaded document; structuring and
/// position data are produced regardless.
pub trait RenderCapabilities {
    fn renders_natively(&self, format: DocumentFormat) -> bool;
}

/// Hosts without any native viewer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoNativeRendering;

impl RenderCapabilities for NoNativeRendering {
    fn renders_natively(&self, _format: DocumentFormat) -> bool {
        false
    }
}

/// Decoder for `.txt` files.
///
/// Invalid UTF-8 bytes are mapped through a Windows-1252 style table instead
/// of failing the whole file.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextDecoder;

impl Decoder for PlainTextDecoder {
    async fn decode(&self, bytes: &[u8]) -> Result<DecodedDocument, DecodeError> {
        Ok(DecodedDocument {
            format: DocumentFormat::PlainText,
            sections: vec![Section::text("text", &decode_text_bytes(bytes))],
            outline: None,
            assets: Vec::new(),
            layout: SectionLayout::Logical,
        })
    }
}

pub fn decode_text_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match core::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                // `valid_up_to` guarantees this prefix is UTF-8.
                out.push_str(core::str::from_utf8(valid).unwrap_or_default());
                let bad_len = err.error_len().unwrap_or(after.len());
                out.extend(after[..bad_len].iter().copied().map(decode_single_byte_fallback));
                rest = &after[bad_len..];
            }
        }
    }

    out
}

fn decode_single_byte_fallback(byte: u8) -> char {
    match byte {
        0x91 | 0x92 => '\'',
        0x93 | 0x94 => '"',
        0x96 | 0x97 => '-',
        0x85 => '…',
        0xA0 => ' ',
        0xA1..=0xFF => char::from(byte),
        _ if byte.is_ascii() => char::from(byte),
        _ => '?',
    }
}
