use super::{Token, TokenKind, build_word_stream};

/// Page-view markup where every word carries its global index.
///
/// The page renderer reports taps with the `data-word` value, so the core
/// never has to locate a word by matching text.
pub(super) fn render_chapter_markup(raw_text: &str, start_word_index: usize) -> String {
    let tokens = build_word_stream(raw_text);
    let mut out = String::with_capacity(raw_text.len() * 2);
    if tokens.is_empty() {
        return out;
    }

    out.push_str("<p>");
    for (offset, token) in tokens.iter().enumerate() {
        let index = start_word_index + offset;
        match token.kind {
            TokenKind::ParagraphBreak => out.push_str("</p>\n<p>"),
            TokenKind::Word | TokenKind::FirstAfterBreak => {
                if !out.ends_with("<p>") {
                    out.push(' ');
                }
                push_word_span(&mut out, index, token);
            }
        }
    }
    out.push_str("</p>");
    out
}

fn push_word_span(out: &mut String, index: usize, token: &Token) {
    out.push_str("<span data-word=\"");
    out.push_str(&index.to_string());
    out.push_str("\">");
    for ch in token.text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out.push_str("</span>");
}
