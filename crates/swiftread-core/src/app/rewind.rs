impl<IN> ReaderApp<IN>
where
    IN: InputProvider,
{
    // A tap steps back once and leaves playback paused; a hold keeps stepping
    // back and resumes playback on release.
    fn rewind_pressed(&mut self, now_ms: u64) {
        if self.rewind.pressed_at_ms.is_some() || self.document.total_words() == 0 {
            return;
        }
        if self.playback != PlaybackState::Stopped {
            self.enter_pause(PauseCause::Rewind, now_ms);
        }
        self.rewind = RewindGesture {
            pressed_at_ms: Some(now_ms),
            next_step_ms: Some(now_ms + REWIND_HOLD_THRESHOLD_MS),
            held: false,
        };
    }

    fn tick_rewind(&mut self, now_ms: u64) {
        let (Some(pressed_at), Some(due)) = (self.rewind.pressed_at_ms, self.rewind.next_step_ms)
        else {
            return;
        };
        if now_ms < due {
            return;
        }

        self.rewind.held = true;
        self.step_back();
        let held_for = now_ms.saturating_sub(pressed_at + REWIND_HOLD_THRESHOLD_MS);
        self.rewind.next_step_ms = Some(now_ms + rewind_interval_ms(held_for));
    }

    fn rewind_released(&mut self, now_ms: u64) {
        let Some(pressed_at) = self.rewind.pressed_at_ms else {
            return;
        };
        let stepped = self.rewind.held;
        let held = stepped || now_ms.saturating_sub(pressed_at) >= REWIND_HOLD_THRESHOLD_MS;
        self.rewind = RewindGesture::default();

        if held {
            if !stepped {
                self.step_back();
            }
            debug!("ui-input: rewind hold released at={}", self.current_word_index);
            let _ = self.resume(now_ms);
        } else {
            self.step_back();
            self.enter_pause(PauseCause::User, now_ms);
            self.request_save(SaveReason::Pause);
        }
    }

    fn step_back(&mut self) {
        if self.current_word_index > 0 {
            self.move_to(self.current_word_index - 1);
        }
    }
}

fn rewind_interval_ms(held_for_ms: u64) -> u64 {
    REWIND_TIERS
        .iter()
        .find(|(after_ms, _)| held_for_ms >= *after_ms)
        .map_or(250, |(_, interval_ms)| *interval_ms)
}
