use super::{PARAGRAPH_BREAK_TEXT, Token, TokenKind};

/// Split `text` into the annotated token sequence used for playback.
///
/// Every non-empty line after the first one is preceded by a single
/// paragraph-break token, and its first word is marked
/// [`TokenKind::FirstAfterBreak`]. Blank lines never produce tokens, so runs of
/// empty lines collapse into one break.
pub fn build_word_stream(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut seen_line = false;

    for line in text.lines() {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            continue;
        };

        if seen_line {
            tokens.push(Token::new(PARAGRAPH_BREAK_TEXT, TokenKind::ParagraphBreak));
            tokens.push(Token::new(first, TokenKind::FirstAfterBreak));
        } else {
            tokens.push(Token::new(first, TokenKind::Word));
            seen_line = true;
        }

        for word in words {
            tokens.push(Token::new(word, TokenKind::Word));
        }
    }

    tokens
}

/// Length of [`build_word_stream`] for `text`, without allocating tokens.
pub fn count_tokens(text: &str) -> usize {
    let mut count = 0usize;
    let mut seen_line = false;

    for line in text.lines() {
        let words = line.split_whitespace().count();
        if words == 0 {
            continue;
        }
        if seen_line {
            count += 1;
        }
        seen_line = true;
        count += words;
    }

    count
}

/// Slot index of the `ordinal`-th real word (zero-based) in `tokens`.
///
/// Returns `tokens.len()` when there are fewer real words than `ordinal + 1`.
pub fn slot_of_real_word(tokens: &[Token], ordinal: usize) -> usize {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| !token.is_paragraph_break())
        .nth(ordinal)
        .map(|(slot, _)| slot)
        .unwrap_or(tokens.len())
}
