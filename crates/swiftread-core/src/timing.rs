//! Per-token display timing and optimal recognition point (ORP) placement.

use heapless::Vec as FrameVec;

use crate::{content::Token, settings::Settings};

/// Delay used when the configured rate is unusable.
pub const FALLBACK_DELAY_MS: u32 = 200;
pub const FIRST_AFTER_BREAK_FACTOR: f32 = 1.5;
pub const COMMA_FACTOR: f32 = 1.5;
/// Words with at least this many letters are slowed down.
pub const LONG_WORD_LETTERS: usize = 12;
pub const MAX_FRAME_WORDS: usize = 5;

const SENTENCE_PUNCTUATION: [char; 6] = ['.', '!', '?', ';', ':', '…'];
const TRAILING_CLOSERS: [char; 9] = ['"', '\'', ')', ']', '}', '»', '”', '’', '›'];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingParams {
    pub wpm: u16,
    pub pause_on_punctuation: bool,
    pub punctuation_multiplier: f32,
    /// Extra percent of base delay per letter beyond the long-word threshold.
    pub long_word_multiplier: f32,
    pub break_multiplier: f32,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for TimingParams {
    fn from(settings: &Settings) -> Self {
        Self {
            wpm: settings.wpm,
            pause_on_punctuation: settings.pause_on_punctuation,
            punctuation_multiplier: settings.punctuation_multiplier,
            long_word_multiplier: settings.long_word_multiplier,
            break_multiplier: settings.paragraph_break_multiplier,
        }
    }
}

/// Milliseconds `token` stays on screen.
pub fn compute_delay(token: &Token, params: &TimingParams) -> u32 {
    if params.wpm == 0 {
        return FALLBACK_DELAY_MS;
    }

    let base = 60_000.0 / params.wpm as f32;
    if token.is_paragraph_break() {
        return to_ms(base * params.break_multiplier);
    }

    let mut factor = 1.0f32;
    if token.is_first_after_break() {
        factor *= FIRST_AFTER_BREAK_FACTOR;
    }

    let letters = letter_count(&token.text);
    if letters >= LONG_WORD_LETTERS {
        let extra = (letters - (LONG_WORD_LETTERS - 1)) as f32;
        factor *= 1.0 + params.long_word_multiplier / 100.0 * extra;
    }

    if params.pause_on_punctuation {
        match closing_punctuation(&token.text) {
            Some(',') => factor *= COMMA_FACTOR,
            Some(ch) if SENTENCE_PUNCTUATION.contains(&ch) => {
                factor *= params.punctuation_multiplier;
            }
            _ => {}
        }
    }

    to_ms(base * factor)
}

fn to_ms(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

/// Last character of `word` once closing quotes and brackets are skipped.
fn closing_punctuation(word: &str) -> Option<char> {
    word.trim_end_matches(TRAILING_CLOSERS).chars().next_back()
}

fn is_combining_mark(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F
    )
}

fn is_letter(ch: char) -> bool {
    ch.is_alphabetic() && !is_combining_mark(ch)
}

fn letter_count(word: &str) -> usize {
    word.chars().filter(|ch| is_letter(*ch)).count()
}

/// Zero-based letter index of the focal letter within `word`.
pub fn compute_orp_index(word: &str) -> usize {
    match letter_count(word) {
        0..=3 => 0,
        4..=5 => 1,
        6..=9 => 2,
        10..=11 => 3,
        12..=14 => 4,
        15..=17 => 5,
        _ => 6,
    }
}

/// Character index of the focal letter, skipping leading non-letters.
pub fn resolve_orp_char_offset(word: &str) -> usize {
    let target = compute_orp_index(word);
    let mut letters_seen = 0usize;
    let mut char_count = 0usize;

    for (offset, ch) in word.chars().enumerate() {
        char_count = offset + 1;
        if !is_letter(ch) {
            continue;
        }
        if letters_seen == target {
            return offset;
        }
        letters_seen += 1;
    }

    // symbol-only words
    if letters_seen == 0 {
        0
    } else {
        char_count.saturating_sub(1)
    }
}

/// Split `word` into text before the focal char, the focal char, and the rest.
pub fn split_at_orp(word: &str) -> (&str, &str, &str) {
    let offset = resolve_orp_char_offset(word);
    let Some((start, ch)) = word.char_indices().nth(offset) else {
        return (word, "", "");
    };
    let end = start + ch.len_utf8();
    (&word[..start], &word[start..end], &word[end..])
}

/// Up to `frame_size` consecutive real tokens starting at `index`.
///
/// The frame ends early at a paragraph break, so a frame never spans two
/// paragraphs.
pub fn word_frame(
    tokens: &[Token],
    index: usize,
    frame_size: usize,
) -> FrameVec<&Token, MAX_FRAME_WORDS> {
    let mut frame = FrameVec::new();
    let wanted = frame_size.clamp(1, MAX_FRAME_WORDS);

    for token in tokens.iter().skip(index).take(wanted) {
        if token.is_paragraph_break() {
            break;
        }
        if frame.push(token).is_err() {
            break;
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PARAGRAPH_BREAK_TEXT, TokenKind, build_word_stream};

    fn word(text: &str) -> Token {
        Token::new(text, TokenKind::Word)
    }

    fn params() -> TimingParams {
        TimingParams {
            wpm: 300,
            pause_on_punctuation: true,
            punctuation_multiplier: 2.0,
            long_word_multiplier: 10.0,
            break_multiplier: 2.5,
        }
    }

    #[test]
    fn orp_table_boundaries() {
        let cases = [
            (1, 0),
            (3, 0),
            (4, 1),
            (5, 1),
            (6, 2),
            (9, 2),
            (10, 3),
            (11, 3),
            (12, 4),
            (14, 4),
            (15, 5),
            (17, 5),
            (18, 6),
            (30, 6),
        ];
        for (len, expected) in cases {
            let text = "x".repeat(len);
            assert_eq!(compute_orp_index(&text), expected, "length {len}");
        }
    }

    #[test]
    fn orp_counts_letters_only() {
        assert_eq!(compute_orp_index("reading"), 2);
        assert_eq!(compute_orp_index("a"), 0);
        assert_eq!(compute_orp_index("\"read,\""), 1);
        assert_eq!(compute_orp_index("e\u{301}te\u{301}"), 0);
        assert_eq!(compute_orp_index("1999"), 0);
    }

    #[test]
    fn orp_offset_skips_leading_punctuation() {
        assert_eq!(resolve_orp_char_offset("reading"), 2);
        assert_eq!(resolve_orp_char_offset("(reading)"), 3);
        assert_eq!(resolve_orp_char_offset("\u{201C}hello"), 2);
        assert_eq!(resolve_orp_char_offset("--"), 0);
        assert_eq!(resolve_orp_char_offset(""), 0);
    }

    #[test]
    fn split_keeps_multibyte_chars_whole() {
        assert_eq!(split_at_orp("reading"), ("re", "a", "ding"));
        assert_eq!(split_at_orp("élan"), ("é", "l", "an"));
        assert_eq!(split_at_orp("a"), ("", "a", ""));
        assert_eq!(split_at_orp(""), ("", "", ""));
    }

    #[test]
    fn base_delay_follows_wpm() {
        assert_eq!(compute_delay(&word("hello"), &params()), 200);
    }

    #[test]
    fn zero_wpm_falls_back() {
        let params = TimingParams { wpm: 0, ..params() };
        assert_eq!(compute_delay(&word("hello"), &params), FALLBACK_DELAY_MS);
    }

    #[test]
    fn sentence_punctuation_uses_multiplier() {
        assert_eq!(compute_delay(&word("world."), &params()), 400);
        assert_eq!(compute_delay(&word("wait…"), &params()), 400);
        assert_eq!(compute_delay(&word("done.\u{201D}"), &params()), 400);
        assert_eq!(compute_delay(&word("(really?)"), &params()), 400);
    }

    #[test]
    fn comma_is_shorter_than_full_stop() {
        assert_eq!(compute_delay(&word("however,"), &params()), 300);
    }

    #[test]
    fn punctuation_pause_can_be_disabled() {
        let params = TimingParams {
            pause_on_punctuation: false,
            ..params()
        };
        assert_eq!(compute_delay(&word("world."), &params), 200);
    }

    #[test]
    fn paragraph_break_uses_only_break_multiplier() {
        let token = Token::new(PARAGRAPH_BREAK_TEXT, TokenKind::ParagraphBreak);
        assert_eq!(compute_delay(&token, &params()), 500);
    }

    #[test]
    fn adjustments_compose() {
        let token = Token::new("Next.", TokenKind::FirstAfterBreak);
        assert_eq!(compute_delay(&token, &params()), 600);
    }

    #[test]
    fn delay_never_shrinks_as_words_grow() {
        let mut previous = 0;
        for len in 1..=24 {
            let delay = compute_delay(&word(&"m".repeat(len)), &params());
            assert!(delay >= previous, "length {len}: {delay} < {previous}");
            previous = delay;
        }

        let eleven = compute_delay(&word(&"m".repeat(11)), &params());
        let twelve = compute_delay(&word(&"m".repeat(12)), &params());
        let thirteen = compute_delay(&word(&"m".repeat(13)), &params());
        assert!(eleven < twelve && twelve < thirteen);
    }

    #[test]
    fn frame_stops_at_paragraph_break() {
        let tokens = build_word_stream("one two three\nfour five");

        let frame = word_frame(&tokens, 1, 3);
        let texts = frame.iter().map(|t| t.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["two", "three"]);

        assert!(word_frame(&tokens, 3, 2).is_empty());
        assert_eq!(word_frame(&tokens, 0, 99).len(), 3);
        assert_eq!(word_frame(&tokens, 0, 0).len(), 1);
        assert!(word_frame(&tokens, 42, 2).is_empty());
    }
}
