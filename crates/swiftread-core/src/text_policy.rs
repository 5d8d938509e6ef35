//! Shared text shaping and truncation policies for compact UI surfaces.

pub const COMPACT_MAX_WORDS: usize = 7;
pub const COMPACT_MAX_CHARS: usize = 34;

/// Short excerpt for navigation lists.
pub fn preview_compact(source: &str) -> String {
    preview_limited(source, COMPACT_MAX_WORDS, COMPACT_MAX_CHARS)
}

/// First words of `source`, whitespace-normalised and cut at `max_words`
/// words or `max_chars` characters, with `...` appended when truncated.
pub fn preview_limited(source: &str, max_words: usize, max_chars: usize) -> String {
    let mut out = String::new();
    let mut char_count = 0usize;
    let mut truncated = false;

    'words: for (word_count, word) in source.split_whitespace().enumerate() {
        if word_count >= max_words {
            truncated = true;
            break;
        }

        if word_count > 0 {
            if char_count >= max_chars {
                truncated = true;
                break;
            }
            out.push(' ');
            char_count += 1;
        }

        for ch in word.chars() {
            if char_count >= max_chars {
                truncated = true;
                break 'words;
            }
            out.push(ch);
            char_count += 1;
        }
    }

    if truncated && !out.is_empty() {
        out.truncate(out.trim_end().len());
        out.push_str("...");
    }
    out
}

/// Title for a chapter that has no usable name of its own.
pub fn fallback_chapter_title(chapter_number: usize) -> String {
    format!("Chapter {chapter_number}")
}

/// Whole-percent progress label, e.g. `42%`.
pub fn progress_percent_label(percent: f32) -> String {
    format!("{:.0}%", percent.clamp(0.0, 100.0).floor())
}

pub fn words_left_label(words_left: usize) -> String {
    match words_left {
        1 => "1 word left".to_owned(),
        n => format!("{n} words left"),
    }
}

/// `index/total` with an optional unit suffix, e.g. `3/12 ch`.
pub fn section_secondary_label(index: usize, total: usize, suffix: &str) -> String {
    if suffix.is_empty() {
        format!("{index}/{total}")
    } else {
        format!("{index}/{total} {suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_kept_whole() {
        assert_eq!(preview_compact("  Call me   Ishmael. "), "Call me Ishmael.");
    }

    #[test]
    fn word_limit_appends_ellipsis() {
        assert_eq!(preview_limited("one two three four", 2, 100), "one two...");
    }

    #[test]
    fn char_limit_cuts_inside_word() {
        assert_eq!(preview_limited("abcdef ghij", 10, 4), "abcd...");
    }

    #[test]
    fn progress_labels() {
        assert_eq!(progress_percent_label(49.9), "49%");
        assert_eq!(progress_percent_label(140.0), "100%");
        assert_eq!(words_left_label(1), "1 word left");
        assert_eq!(words_left_label(0), "0 words left");
    }

    #[test]
    fn secondary_label_formats() {
        assert_eq!(section_secondary_label(3, 12, "ch"), "3/12 ch");
        assert_eq!(section_secondary_label(1, 1, ""), "1/1");
    }
}
