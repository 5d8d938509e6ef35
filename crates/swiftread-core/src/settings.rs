//! Persisted user settings.

use serde::{Deserialize, Serialize};

pub const WPM_STEP: u16 = 10;
pub const MIN_WPM: u16 = 60;
pub const MAX_WPM: u16 = 1_500;
pub const MIN_FRAME_SIZE: u8 = 1;
pub const MAX_FRAME_SIZE: u8 = 5;

/// What the progress label under the reader shows.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChapterProgressMode {
    Off,
    #[default]
    Percent,
    WordsLeft,
}

/// User-tunable settings that survive restarts.
///
/// Every field falls back to its default when missing from stored data, so
/// sessions written by older builds keep loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub wpm: u16,
    pub pause_on_punctuation: bool,
    pub punctuation_multiplier: f32,
    pub paragraph_break_multiplier: f32,
    pub long_word_multiplier: f32,
    /// Words between automatic breathers; 0 disables them.
    pub periodic_pause_interval: u32,
    pub periodic_pause_ms: u32,
    pub fade_enabled: bool,
    pub fade_ms: u32,
    pub frame_size: u8,
    pub image_pause_enabled: bool,
    pub image_pause_ms: u32,
    pub chapter_progress: ChapterProgressMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wpm: 300,
            pause_on_punctuation: true,
            punctuation_multiplier: 2.0,
            paragraph_break_multiplier: 2.5,
            long_word_multiplier: 10.0,
            periodic_pause_interval: 0,
            periodic_pause_ms: 2_000,
            fade_enabled: false,
            fade_ms: 150,
            frame_size: 1,
            image_pause_enabled: true,
            image_pause_ms: 3_000,
            chapter_progress: ChapterProgressMode::Percent,
        }
    }
}

impl Settings {
    /// Copy with every bounded field pulled back into range.
    pub fn clamped(mut self) -> Self {
        self.wpm = self.wpm.clamp(MIN_WPM, MAX_WPM);
        self.frame_size = self.frame_size.clamp(MIN_FRAME_SIZE, MAX_FRAME_SIZE);
        for multiplier in [
            &mut self.punctuation_multiplier,
            &mut self.paragraph_break_multiplier,
        ] {
            if !multiplier.is_finite() || *multiplier < 1.0 {
                *multiplier = 1.0;
            }
        }
        if !self.long_word_multiplier.is_finite() || self.long_word_multiplier < 0.0 {
            self.long_word_multiplier = 0.0;
        }
        self
    }

    /// Step the reading rate by [`WPM_STEP`]; returns whether it changed.
    pub fn adjust_wpm(&mut self, increase: bool) -> bool {
        let next = if increase {
            self.wpm.saturating_add(WPM_STEP).min(MAX_WPM)
        } else {
            self.wpm.saturating_sub(WPM_STEP).max(MIN_WPM)
        };

        if next != self.wpm {
            self.wpm = next;
            true
        } else {
            false
        }
    }
}
