//! Playback orchestrator: one reading position shared by the word-at-a-time
//! and page views, driven by host ticks.

use log::{debug, info, warn};

use crate::{
    content::{Document, DocumentSource, DocumentStructure, ImageMarker, IngestionError, Token},
    input::{InputEvent, InputProvider},
    position::{
        chapter_at, chapter_progress, scroll_percent_in_chapter, word_index_from_number,
        word_index_from_percentage, word_index_from_scroll,
    },
    session::{Session, ViewMode},
    settings::{ChapterProgressMode, Settings},
    text_policy::{progress_percent_label, words_left_label},
    timing::{MAX_FRAME_WORDS, TimingParams, compute_delay, word_frame},
};

/// Interval between automatic saves while playing or auto-scrolling.
pub const AUTOSAVE_INTERVAL_MS: u64 = 10_000;
/// Presses shorter than this are taps.
pub const REWIND_HOLD_THRESHOLD_MS: u64 = 200;
const REWIND_TIERS: [(u64, u64); 3] = [(2_500, 60), (1_000, 125), (0, 250)];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    RenderRequested,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Why playback is paused; automatic pauses resume on their own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PauseCause {
    User,
    Image,
    Periodic,
    Rewind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveReason {
    Autosave,
    Pause,
    Stop,
    Navigation,
    ModeSwitch,
    SettingsChanged,
    DocumentLoaded,
    VisibilityLost,
}

impl SaveReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Autosave => "autosave",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::Navigation => "navigation",
            Self::ModeSwitch => "mode_switch",
            Self::SettingsChanged => "settings",
            Self::DocumentLoaded => "document_loaded",
            Self::VisibilityLost => "visibility_lost",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RestoreError {
    EmptyDocument,
    BrokenStructure,
}

impl core::fmt::Display for RestoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyDocument => f.write_str("saved session has no document text"),
            Self::BrokenStructure => f.write_str("saved chapter structure is inconsistent"),
        }
    }
}

impl std::error::Error for RestoreError {}

/// Page view state derived from the reading position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PageView {
    pub chapter_index: usize,
    pub scroll_percentage: f32,
    /// Highlighted word; always the reading position when set.
    pub highlight: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default)]
struct RewindGesture {
    pressed_at_ms: Option<u64>,
    next_step_ms: Option<u64>,
    held: bool,
}

pub struct ReaderApp<IN>
where
    IN: InputProvider,
{
    input: IN,
    document: Document,
    settings: Settings,
    timing: TimingParams,
    current_word_index: usize,
    playback: PlaybackState,
    pause_cause: Option<PauseCause>,
    view_mode: ViewMode,
    page: PageView,
    next_step_ms: Option<u64>,
    auto_resume_ms: Option<u64>,
    autosave_due_ms: Option<u64>,
    rewind: RewindGesture,
    auto_scrolling: bool,
    ingesting: bool,
    pending_save: Option<SaveReason>,
    pending_redraw: bool,
    last_now_ms: u64,
}

include!("runtime.rs");
include!("input.rs");
include!("rewind.rs");
include!("navigation.rs");
include!("session.rs");

impl<IN> ReaderApp<IN>
where
    IN: InputProvider,
{
    /// Reader showing the built-in placeholder text.
    pub fn new(input: IN, settings: Settings) -> Self {
        let settings = settings.clamped();
        Self {
            input,
            document: Document::placeholder(),
            timing: TimingParams::from(&settings),
            settings,
            current_word_index: 0,
            playback: PlaybackState::Stopped,
            pause_cause: None,
            view_mode: ViewMode::WordAtATime,
            page: PageView::default(),
            next_step_ms: None,
            auto_resume_ms: None,
            autosave_due_ms: None,
            rewind: RewindGesture::default(),
            auto_scrolling: false,
            ingesting: false,
            pending_save: None,
            pending_redraw: true,
            last_now_ms: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn position(&self) -> usize {
        self.current_word_index
    }

    pub fn total_words(&self) -> usize {
        self.document.total_words()
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn pause_cause(&self) -> Option<PauseCause> {
        self.pause_cause
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn page_view(&self) -> PageView {
        self.page
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingesting
    }

    pub fn input_mut(&mut self) -> &mut IN {
        &mut self.input
    }

    /// Deadline of the pending step, if one is scheduled.
    pub fn next_step_ms(&self) -> Option<u64> {
        self.next_step_ms
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.document.words.get(self.current_word_index)
    }

    /// Words to show together for the current position.
    pub fn current_frame(&self) -> heapless::Vec<&Token, MAX_FRAME_WORDS> {
        word_frame(
            &self.document.words,
            self.current_word_index,
            self.settings.frame_size as usize,
        )
    }

    /// Image being shown while playback waits on it.
    pub fn current_image(&self) -> Option<&ImageMarker> {
        if self.pause_cause != Some(PauseCause::Image) {
            return None;
        }
        self.document
            .structure
            .available_image_at(self.current_word_index)
    }

    /// Progress text for the current chapter, per the configured mode.
    pub fn chapter_progress_label(&self) -> Option<String> {
        let structure = &self.document.structure;
        let chapter = structure
            .chapters
            .get(chapter_at(structure, self.current_word_index))?;

        match self.settings.chapter_progress {
            ChapterProgressMode::Off => None,
            ChapterProgressMode::Percent => Some(progress_percent_label(chapter_progress(
                chapter,
                self.current_word_index,
            ))),
            ChapterProgressMode::WordsLeft => Some(words_left_label(
                chapter.end_word_index.saturating_sub(self.current_word_index),
            )),
        }
    }

    /// Replace settings; timing changes apply from the next scheduled step.
    pub fn apply_settings(&mut self, settings: Settings) {
        let settings = settings.clamped();
        if settings == self.settings {
            return;
        }
        self.timing = TimingParams::from(&settings);
        self.settings = settings;
        if self.settings.periodic_pause_interval == 0
            && self.pause_cause == Some(PauseCause::Periodic)
        {
            self.auto_resume_ms = Some(self.last_now_ms);
        }
        self.request_save(SaveReason::SettingsChanged);
        self.pending_redraw = true;
    }

    /// Pending save, cleared on read. Several requests between two reads
    /// collapse into the latest one.
    pub fn take_save_request(&mut self) -> Option<SaveReason> {
        self.pending_save.take()
    }

    fn request_save(&mut self, reason: SaveReason) {
        debug!("playback: save requested reason={}", reason.as_str());
        self.pending_save = Some(reason);
    }
}

#[cfg(test)]
mod tests;
