impl<IN> ReaderApp<IN>
where
    IN: InputProvider,
{
    fn process_inputs(&mut self, now_ms: u64) {
        loop {
            match self.input.poll_event() {
                Ok(Some(event)) => self.apply_input_event(event, now_ms),
                Ok(None) => break,
                Err(_) => {
                    warn!("ui-input: provider error, dropping remaining events");
                    break;
                }
            }
        }
    }

    fn apply_input_event(&mut self, event: InputEvent, now_ms: u64) {
        if self.ingesting && event != InputEvent::VisibilityLost {
            debug!("ui-input: ignored {event:?} while ingesting");
            return;
        }

        match event {
            InputEvent::TogglePlayback => match self.playback {
                PlaybackState::Playing => self.pause(now_ms),
                PlaybackState::Paused | PlaybackState::Stopped => {
                    let _ = self.resume(now_ms);
                }
            },
            InputEvent::Stop => self.stop(),
            InputEvent::RewindPressed => self.rewind_pressed(now_ms),
            InputEvent::RewindReleased => self.rewind_released(now_ms),
            InputEvent::SpeedUp | InputEvent::SpeedDown => {
                let mut settings = self.settings.clone();
                if settings.adjust_wpm(event == InputEvent::SpeedUp) {
                    debug!("ui-input: wpm={}", settings.wpm);
                    self.apply_settings(settings);
                }
            }
            InputEvent::SelectWord(index) => self.select_word(index),
            InputEvent::VisibilityLost => self.visibility_lost(),
        }
    }
}
