//! Minimal XHTML-to-text pass for chapter sections.
//!
//! This is not a general HTML parser. It keeps body text, turns block-level
//! tags into line breaks (one line per paragraph), decodes character
//! references, and records where images sit relative to the words around them.

use super::html_entities::decode_html_entity;

const FLAG_IN_HEAD: u8 = 1 << 0;
const FLAG_IN_BODY: u8 = 1 << 1;
const FLAG_BODY_SEEN: u8 = 1 << 2;
const FLAG_IN_SCRIPT: u8 = 1 << 3;
const FLAG_IN_STYLE: u8 = 1 << 4;

const MAX_ENTITY_LEN: usize = 16;

/// Image reference found in section markup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HtmlImage {
    pub src: String,
    pub alt: String,
    /// Real words emitted before the image in this section.
    pub words_before: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SanitizedHtml {
    pub text: String,
    pub images: Vec<HtmlImage>,
    /// Text of the first `h1`-`h3`, when present.
    pub heading: Option<String>,
}

#[derive(Clone, Copy, Debug, Default)]
struct HtmlParseState {
    flags: u8,
}

impl HtmlParseState {
    fn has(self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    fn set(&mut self, flag: u8, enabled: bool) {
        if enabled {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    fn should_emit_text(self) -> bool {
        if self.has(FLAG_IN_SCRIPT) || self.has(FLAG_IN_STYLE) {
            return false;
        }
        if self.has(FLAG_BODY_SEEN) {
            return self.has(FLAG_IN_BODY);
        }
        !self.has(FLAG_IN_HEAD)
    }

    fn apply(&mut self, tag: &TagInfo<'_>) {
        let opening = !tag.is_closing && !tag.is_self_closing;
        match tag.local_name.to_ascii_lowercase().as_str() {
            "head" => self.set(FLAG_IN_HEAD, opening),
            "body" => {
                if tag.is_closing {
                    self.set(FLAG_IN_BODY, false);
                } else {
                    self.set(FLAG_BODY_SEEN, true);
                    self.set(FLAG_IN_HEAD, false);
                    self.set(FLAG_IN_BODY, !tag.is_self_closing);
                }
            }
            "script" => self.set(FLAG_IN_SCRIPT, opening),
            "style" => self.set(FLAG_IN_STYLE, opening),
            _ => {}
        }
    }
}

struct TagInfo<'a> {
    local_name: &'a str,
    attributes: &'a str,
    is_closing: bool,
    is_self_closing: bool,
}

fn parse_tag(raw: &str) -> Option<TagInfo<'_>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with(['!', '?']) {
        return None;
    }

    let (is_closing, rest) = match raw.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, raw),
    };
    let is_self_closing = rest.ends_with('/');
    let name_end = rest
        .find(|ch: char| ch.is_whitespace() || ch == '/')
        .unwrap_or(rest.len());
    if name_end == 0 {
        return None;
    }

    let name = &rest[..name_end];
    let local_name = name.rsplit_once(':').map_or(name, |(_, local)| local);
    Some(TagInfo {
        local_name,
        attributes: rest[name_end..].trim_end_matches('/'),
        is_closing,
        is_self_closing,
    })
}

fn is_block_level(local_name: &str) -> bool {
    matches!(
        local_name.to_ascii_lowercase().as_str(),
        "p" | "div"
            | "section"
            | "article"
            | "aside"
            | "header"
            | "footer"
            | "nav"
            | "li"
            | "ul"
            | "ol"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "pre"
            | "table"
            | "tr"
            | "br"
            | "hr"
            | "figure"
            | "figcaption"
    )
}

fn is_heading(local_name: &str) -> bool {
    matches!(local_name.to_ascii_lowercase().as_str(), "h1" | "h2" | "h3")
}

/// Value of attribute `name` (matched on its local part, so `xlink:href`
/// answers to `href`).
fn attribute<'a>(attributes: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = attributes;
    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].split_whitespace().last().unwrap_or("");
        let key = key.rsplit_once(':').map_or(key, |(_, local)| local);
        let after = rest[eq + 1..].trim_start();
        let (value, remaining) = match after.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &after[1..];
                let end = body.find(quote).unwrap_or(body.len());
                (&body[..end], body.get(end + 1..).unwrap_or(""))
            }
            _ => {
                let end = after.find(char::is_whitespace).unwrap_or(after.len());
                (&after[..end], &after[end..])
            }
        };
        if key.eq_ignore_ascii_case(name) {
            return Some(value);
        }
        rest = remaining;
    }
    None
}

struct TextSink {
    out: String,
    words: usize,
    last_was_space: bool,
}

impl TextSink {
    fn push_char(&mut self, ch: char) {
        if ch.is_whitespace() {
            if !self.out.is_empty() && !self.last_was_space {
                self.out.push(' ');
            }
            self.last_was_space = true;
            return;
        }
        if ch.is_control() {
            return;
        }
        if self.last_was_space || self.out.is_empty() {
            self.words += 1;
        }
        self.out.push(ch);
        self.last_was_space = false;
    }

    fn push_paragraph_break(&mut self) {
        while self.out.ends_with(' ') {
            self.out.pop();
        }
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.last_was_space = true;
    }

    /// Inline tags do not split words (`<b>w</b>ord`), except the few that
    /// stand for a visual gap.
    fn push_soft_boundary_if_needed(&mut self, local_name: &str) {
        if matches!(local_name, "td" | "th" | "dt" | "dd" | "img" | "image") {
            self.push_char(' ');
        }
    }
}

/// Strip markup from one section, keeping paragraph structure and images.
pub fn sanitize_html(html: &str) -> SanitizedHtml {
    let mut state = HtmlParseState::default();
    let mut sink = TextSink {
        out: String::with_capacity(html.len() / 2),
        words: 0,
        last_was_space: true,
    };
    let mut images = Vec::new();
    let mut heading: Option<String> = None;
    let mut heading_start: Option<usize> = None;
    let mut cursor = 0usize;

    while let Some(rel) = html[cursor..].find(['<', '&']) {
        let at = cursor + rel;
        if state.should_emit_text() {
            for ch in html[cursor..at].chars() {
                sink.push_char(ch);
            }
        }

        if html[at..].starts_with('&') {
            let body_end = html[at + 1..]
                .char_indices()
                .take(MAX_ENTITY_LEN + 1)
                .find(|(_, ch)| *ch == ';')
                .map(|(offset, _)| at + 1 + offset);
            let decoded = body_end.and_then(|end| decode_html_entity(&html[at + 1..end]));
            match (decoded, body_end) {
                (Some(ch), Some(end)) => {
                    if state.should_emit_text() {
                        sink.push_char(ch);
                    }
                    cursor = end + 1;
                }
                _ => {
                    if state.should_emit_text() {
                        sink.push_char('&');
                    }
                    cursor = at + 1;
                }
            }
            continue;
        }

        if html[at..].starts_with("<!--") {
            cursor = html[at + 4..]
                .find("-->")
                .map_or(html.len(), |end| at + 4 + end + 3);
            continue;
        }
        if html[at..].starts_with("<![CDATA[") {
            let body_start = at + 9;
            let end = html[body_start..]
                .find("]]>")
                .map_or(html.len(), |end| body_start + end);
            if state.should_emit_text() {
                for ch in html[body_start..end].chars() {
                    sink.push_char(ch);
                }
            }
            cursor = (end + 3).min(html.len());
            continue;
        }

        let Some(tag_end) = html[at + 1..].find('>').map(|end| at + 1 + end) else {
            cursor = html.len();
            break;
        };
        cursor = tag_end + 1;
        let Some(tag) = parse_tag(&html[at + 1..tag_end]) else {
            continue;
        };

        state.apply(&tag);
        if !state.should_emit_text() {
            continue;
        }

        let name = tag.local_name.to_ascii_lowercase();
        if !tag.is_closing && (name == "img" || name == "image") {
            let src = attribute(tag.attributes, "src")
                .or_else(|| attribute(tag.attributes, "href"))
                .unwrap_or("");
            if !src.is_empty() {
                let alt = attribute(tag.attributes, "alt").unwrap_or("");
                images.push(HtmlImage {
                    src: decode_attribute(src),
                    alt: decode_attribute(alt),
                    words_before: sink.words,
                });
            }
        }

        if is_heading(&name) && heading.is_none() {
            if tag.is_closing {
                if let Some(start) = heading_start.take() {
                    let words = sink.out.get(start..).unwrap_or("").split_whitespace();
                    let text = words.collect::<Vec<_>>().join(" ");
                    if !text.is_empty() {
                        heading = Some(text);
                    }
                }
            } else if !tag.is_self_closing {
                sink.push_paragraph_break();
                heading_start = Some(sink.out.len());
                continue;
            }
        }

        if is_block_level(&name) {
            sink.push_paragraph_break();
        } else {
            sink.push_soft_boundary_if_needed(&name);
        }
    }

    if cursor < html.len() && state.should_emit_text() {
        for ch in html[cursor..].chars() {
            sink.push_char(ch);
        }
    }

    while sink.out.ends_with([' ', '\n']) {
        sink.out.pop();
    }

    SanitizedHtml {
        text: sink.out,
        images,
        heading,
    }
}

fn decode_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match tail
            .find(';')
            .filter(|end| *end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_html_entity(&tail[..end]).map(|ch| (ch, end)))
        {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
