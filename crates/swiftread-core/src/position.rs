//! Conversions between the global word index, chapters, and scroll offsets.
//!
//! The word index is the only stored position; everything here derives from
//! it and never feeds back on its own.

use crate::content::{Chapter, DocumentStructure};

const SCROLL_EPSILON: f64 = 1e-3;

/// Index of the first chapter containing `word_index`, or 0 when none does.
pub fn chapter_at(structure: &DocumentStructure, word_index: usize) -> usize {
    structure
        .chapters
        .iter()
        .position(|chapter| chapter.contains(word_index))
        .unwrap_or(0)
}

/// Offset of `word_index` within `chapter`, in percent. Zero-width chapters
/// report 0.
pub fn scroll_percent_in_chapter(chapter: &Chapter, word_index: usize) -> f32 {
    let width = chapter.end_word_index.saturating_sub(chapter.start_word_index);
    if width == 0 {
        return 0.0;
    }
    let offset = word_index as f64 - chapter.start_word_index as f64;
    (offset / width as f64 * 100.0) as f32
}

/// Inverse of [`scroll_percent_in_chapter`], floored and clamped into the
/// chapter's half-open interval.
pub fn word_index_from_scroll(chapter: &Chapter, percent: f32) -> usize {
    let start = chapter.start_word_index;
    let width = chapter.end_word_index.saturating_sub(start);
    if width == 0 {
        return start;
    }
    let percent = clamp_percent(percent);
    // absorb f32 rounding so a derived percent maps back to its own word
    let offset = (width as f64 * percent as f64 / 100.0 + SCROLL_EPSILON).floor() as usize;
    start + offset.min(width - 1)
}

/// Progress through `chapter` for display; always within `0..=100`.
pub fn chapter_progress(chapter: &Chapter, word_index: usize) -> f32 {
    scroll_percent_in_chapter(chapter, word_index).clamp(0.0, 100.0)
}

/// Word index at `percent` of the whole document, clamped to a valid slot.
pub fn word_index_from_percentage(total_words: usize, percent: f32) -> usize {
    if total_words == 0 {
        return 0;
    }
    let percent = clamp_percent(percent);
    let index = (total_words as f64 * percent as f64 / 100.0).floor() as usize;
    index.min(total_words - 1)
}

fn clamp_percent(percent: f32) -> f32 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Word index for a 1-based word number.
pub fn word_index_from_number(total_words: usize, number: usize) -> usize {
    number.saturating_sub(1).min(total_words.saturating_sub(1))
}
