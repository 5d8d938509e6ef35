impl<IN> ReaderApp<IN>
where
    IN: InputProvider,
{
    /// Switch views. Entering the page view pauses playback and derives the
    /// chapter, scroll offset and highlight from the reading position;
    /// leaving it keeps the position exactly as it was.
    pub fn switch_mode(&mut self, mode: ViewMode) {
        if mode == self.view_mode {
            return;
        }
        if mode == ViewMode::Paginated && self.playback != PlaybackState::Stopped {
            self.enter_pause(PauseCause::User, self.last_now_ms);
        }
        self.set_view_mode(mode);
        self.request_save(SaveReason::ModeSwitch);
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        match mode {
            ViewMode::Paginated => self.sync_page_view(),
            ViewMode::WordAtATime => self.page.highlight = None,
        }
        self.pending_redraw = true;
        debug!(
            "ui-nav: mode={:?} at={} chapter={}",
            mode, self.current_word_index, self.page.chapter_index
        );
    }

    /// Record a scroll in the page view. The reading position is untouched.
    pub fn page_scrolled(&mut self, percent: f32) {
        if self.view_mode != ViewMode::Paginated || !percent.is_finite() {
            return;
        }
        self.page.scroll_percentage = percent.clamp(0.0, 100.0);
    }

    /// Word the page view's scroll offset currently points at.
    pub fn word_at_scroll(&self) -> Option<usize> {
        let chapter = self.document.structure.chapters.get(self.page.chapter_index)?;
        Some(word_index_from_scroll(chapter, self.page.scroll_percentage))
    }

    /// A word was tapped in the page view.
    pub fn select_word(&mut self, word_index: usize) {
        if word_index >= self.document.total_words() {
            debug!("ui-nav: ignored selection of word {word_index}");
            return;
        }
        self.move_to(word_index);
        self.request_save(SaveReason::Navigation);
    }

    pub fn navigate_to_chapter(&mut self, chapter_index: usize) -> bool {
        let Some(start) = self
            .document
            .structure
            .chapters
            .get(chapter_index)
            .map(|chapter| chapter.start_word_index)
        else {
            return false;
        };
        self.move_to(start);
        if self.view_mode == ViewMode::Paginated {
            // empty chapters share their start index with the next one
            self.page.chapter_index = chapter_index;
            self.page.scroll_percentage = 0.0;
        }
        self.request_save(SaveReason::Navigation);
        true
    }

    pub fn jump_to_percentage(&mut self, percent: f32) {
        let target = word_index_from_percentage(self.document.total_words(), percent);
        self.move_to(target);
        self.request_save(SaveReason::Navigation);
    }

    /// Jump to a 1-based word number.
    pub fn jump_to_word_number(&mut self, number: usize) {
        let target = word_index_from_number(self.document.total_words(), number);
        self.move_to(target);
        self.request_save(SaveReason::Navigation);
    }

    /// Set the reading position, clamped to the document.
    pub fn set_position(&mut self, word_index: usize) {
        self.move_to(word_index);
    }

    fn move_to(&mut self, word_index: usize) {
        self.current_word_index = word_index.min(self.document.total_words());
        if self.view_mode == ViewMode::Paginated {
            self.sync_page_view();
        }
        if self.playback == PlaybackState::Playing {
            self.schedule_step(self.last_now_ms);
        }
        self.pending_redraw = true;
    }

    fn sync_page_view(&mut self) {
        let total = self.document.total_words();
        // the end-of-text position shows the last word's chapter
        let anchor = self.current_word_index.min(total.saturating_sub(1));
        let structure: &DocumentStructure = &self.document.structure;
        let chapter_index = chapter_at(structure, anchor);
        let scroll_percentage = structure
            .chapters
            .get(chapter_index)
            .map_or(0.0, |chapter| scroll_percent_in_chapter(chapter, anchor));

        self.page = PageView {
            chapter_index,
            scroll_percentage,
            highlight: (self.current_word_index < total).then_some(self.current_word_index),
        };
    }
}
