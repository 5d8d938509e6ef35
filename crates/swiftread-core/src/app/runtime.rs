impl<IN> ReaderApp<IN>
where
    IN: InputProvider,
{
    /// Advance timers to `now_ms`: input, rewind hold, automatic resumes,
    /// the pending step and autosave.
    pub fn tick(&mut self, now_ms: u64) -> TickResult {
        self.last_now_ms = now_ms;
        let before = self.current_word_index;

        self.process_inputs(now_ms);
        self.tick_rewind(now_ms);
        self.tick_auto_resume(now_ms);
        self.tick_playback(now_ms);
        self.tick_autosave(now_ms);

        if self.pending_redraw || self.current_word_index != before {
            self.pending_redraw = false;
            TickResult::RenderRequested
        } else {
            TickResult::NoRender
        }
    }

    /// Start playback. Returns `false` when there is nothing to play or a
    /// document is being ingested.
    pub fn play(&mut self, now_ms: u64) -> bool {
        self.last_now_ms = now_ms;
        if self.ingesting || self.document.total_words() == 0 {
            debug!(
                "playback: play ignored ingesting={} words={}",
                self.ingesting,
                self.document.total_words()
            );
            return false;
        }

        if self.view_mode == ViewMode::Paginated {
            self.set_view_mode(ViewMode::WordAtATime);
        }
        if self.current_word_index >= self.document.total_words() {
            self.current_word_index = 0;
        }

        self.cancel_step();
        self.rewind = RewindGesture::default();
        self.playback = PlaybackState::Playing;
        self.pause_cause = None;
        self.schedule_step(now_ms);
        self.arm_autosave(now_ms);
        self.pending_redraw = true;
        debug!("playback: play at={}", self.current_word_index);
        true
    }

    pub fn pause(&mut self, now_ms: u64) {
        self.last_now_ms = now_ms;
        let already_paused =
            self.playback == PlaybackState::Paused && self.pause_cause == Some(PauseCause::User);
        if self.playback == PlaybackState::Stopped || already_paused {
            return;
        }
        self.enter_pause(PauseCause::User, now_ms);
        self.request_save(SaveReason::Pause);
    }

    /// Continue from the current position. A stopped reader starts playing.
    pub fn resume(&mut self, now_ms: u64) -> bool {
        self.last_now_ms = now_ms;
        match self.playback {
            PlaybackState::Playing => true,
            PlaybackState::Stopped => self.play(now_ms),
            PlaybackState::Paused => {
                if self.ingesting || self.current_word_index >= self.document.total_words() {
                    return false;
                }
                if self.view_mode == ViewMode::Paginated {
                    self.set_view_mode(ViewMode::WordAtATime);
                }
                self.playback = PlaybackState::Playing;
                self.pause_cause = None;
                self.auto_resume_ms = None;
                self.schedule_step(now_ms);
                self.arm_autosave(now_ms);
                self.pending_redraw = true;
                debug!("playback: resume at={}", self.current_word_index);
                true
            }
        }
    }

    /// Halt playback and cancel every timer. The position is kept.
    pub fn stop(&mut self) {
        let was_active = self.playback != PlaybackState::Stopped;
        self.playback = PlaybackState::Stopped;
        self.pause_cause = None;
        self.cancel_step();
        self.auto_resume_ms = None;
        self.rewind = RewindGesture::default();
        self.disarm_autosave();
        if was_active {
            self.request_save(SaveReason::Stop);
            self.pending_redraw = true;
            debug!("playback: stop at={}", self.current_word_index);
        }
    }

    /// One manual step forward.
    pub fn advance(&mut self) {
        let last = self.document.total_words().saturating_sub(1);
        if self.current_word_index >= last {
            return;
        }
        self.move_to(self.current_word_index + 1);
    }

    /// Step back `amount` tokens and pause.
    pub fn rewind(&mut self, amount: usize) {
        let target = self.current_word_index.saturating_sub(amount);
        if self.playback != PlaybackState::Stopped {
            self.enter_pause(PauseCause::User, self.last_now_ms);
            self.request_save(SaveReason::Pause);
        }
        self.move_to(target);
    }

    /// Keep autosave running while the page view scrolls by itself.
    pub fn set_auto_scrolling(&mut self, auto_scrolling: bool, now_ms: u64) {
        self.last_now_ms = now_ms;
        self.auto_scrolling = auto_scrolling;
        if auto_scrolling {
            if self.autosave_due_ms.is_none() {
                self.arm_autosave(now_ms);
            }
        } else if self.playback != PlaybackState::Playing {
            self.disarm_autosave();
        }
    }

    /// The reader left the screen: pause and ask for a best-effort save.
    pub fn visibility_lost(&mut self) {
        if self.playback != PlaybackState::Stopped {
            self.enter_pause(PauseCause::User, self.last_now_ms);
        }
        self.request_save(SaveReason::VisibilityLost);
    }

    /// Pause with `cause`, dropping any pending automatic resume.
    fn enter_pause(&mut self, cause: PauseCause, now_ms: u64) {
        self.playback = PlaybackState::Paused;
        self.pause_cause = Some(cause);
        self.cancel_step();
        self.auto_resume_ms = None;
        if !self.auto_scrolling {
            self.disarm_autosave();
        }
        self.pending_redraw = true;
        debug!(
            "playback: pause cause={:?} at={} now={}",
            cause, self.current_word_index, now_ms
        );
    }

    fn tick_auto_resume(&mut self, now_ms: u64) {
        let Some(due) = self.auto_resume_ms else {
            return;
        };
        if now_ms < due {
            return;
        }
        self.auto_resume_ms = None;
        if self.playback == PlaybackState::Paused
            && matches!(
                self.pause_cause,
                Some(PauseCause::Image | PauseCause::Periodic)
            )
        {
            self.resume(now_ms);
        }
    }

    fn tick_playback(&mut self, now_ms: u64) {
        if self.playback != PlaybackState::Playing {
            return;
        }
        let Some(due) = self.next_step_ms else {
            self.schedule_step(now_ms);
            return;
        };
        if now_ms >= due {
            self.step(now_ms);
        }
    }

    /// Move one token forward and decide what happens next.
    fn step(&mut self, now_ms: u64) {
        self.next_step_ms = None;
        self.current_word_index += 1;
        let total = self.document.total_words();

        if self.current_word_index >= total {
            self.current_word_index = total;
            self.playback = PlaybackState::Stopped;
            self.pause_cause = None;
            self.disarm_autosave();
            self.request_save(SaveReason::Stop);
            info!("playback: end of text words={total}");
            return;
        }

        if self.settings.image_pause_enabled
            && self
                .document
                .structure
                .available_image_at(self.current_word_index)
                .is_some()
        {
            self.enter_pause(PauseCause::Image, now_ms);
            self.auto_resume_ms = Some(now_ms + u64::from(self.settings.image_pause_ms));
            return;
        }

        let interval = self.settings.periodic_pause_interval as usize;
        if interval > 0 && self.current_word_index % interval == 0 {
            self.enter_pause(PauseCause::Periodic, now_ms);
            self.auto_resume_ms = Some(now_ms + u64::from(self.settings.periodic_pause_ms));
            return;
        }

        self.schedule_step(now_ms);
    }

    fn schedule_step(&mut self, now_ms: u64) {
        let delay = self
            .current_token()
            .map_or(0, |token| compute_delay(token, &self.timing));
        self.next_step_ms = Some(now_ms + u64::from(delay));
    }

    fn cancel_step(&mut self) {
        self.next_step_ms = None;
    }

    fn arm_autosave(&mut self, now_ms: u64) {
        self.autosave_due_ms = Some(now_ms + AUTOSAVE_INTERVAL_MS);
    }

    fn disarm_autosave(&mut self) {
        self.autosave_due_ms = None;
    }

    fn tick_autosave(&mut self, now_ms: u64) {
        let Some(due) = self.autosave_due_ms else {
            return;
        };
        if now_ms < due {
            return;
        }
        if self.playback == PlaybackState::Playing || self.auto_scrolling {
            self.request_save(SaveReason::Autosave);
            self.arm_autosave(now_ms);
        } else {
            self.disarm_autosave();
        }
    }
}
