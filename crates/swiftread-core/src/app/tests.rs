use super::*;
use crate::{
    content::{Section, SectionLayout, structure},
    input::MockInput,
};

fn loaded(document: Document, settings: Settings) -> ReaderApp<MockInput> {
    let mut app = ReaderApp::new(MockInput::new(), settings);
    app.begin_ingestion();
    app.finish_ingestion(Ok(document)).unwrap();
    let _ = app.take_save_request();
    app
}

fn plain_app(text: &str) -> ReaderApp<MockInput> {
    loaded(Document::plain(text), Settings::default())
}

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two text chapters of four words each: indices 0..4 and 4..8.
fn two_chapter_document() -> Document {
    let sections = [
        Section::text("ch1.txt", "a b c d"),
        Section::text("ch2.txt", "e f g h"),
    ];
    Document::from_structure(structure(&sections, None, &[], SectionLayout::Logical))
}

/// "one two \n three four" with a picture attached to "three" (index 3).
fn illustrated_document(assets: &[String]) -> Document {
    let sections = [Section::html(
        "ch1.xhtml",
        "<body><p>one two</p><img src=\"pic.png\" alt=\"Pic\"/><p>three four</p></body>",
    )];
    Document::from_structure(structure(&sections, None, assets, SectionLayout::Logical))
}

fn press(app: &mut ReaderApp<MockInput>, event: InputEvent, now_ms: u64) {
    app.input_mut().push(event);
    let _ = app.tick(now_ms);
}

#[test]
fn playback_steps_on_word_delays_and_stops_at_end() {
    let mut app = plain_app("one two three");
    assert!(app.play(0));
    assert_eq!(app.next_step_ms(), Some(200));

    assert_eq!(app.tick(199), TickResult::RenderRequested);
    assert_eq!(app.position(), 0);
    assert_eq!(app.tick(199), TickResult::NoRender);

    app.tick(200);
    assert_eq!(app.position(), 1);
    app.tick(400);
    assert_eq!(app.position(), 2);
    app.tick(600);

    assert_eq!(app.position(), 3);
    assert_eq!(app.playback(), PlaybackState::Stopped);
    assert_eq!(app.next_step_ms(), None);
    assert_eq!(app.take_save_request(), Some(SaveReason::Stop));
}

#[test]
fn play_at_end_restarts_from_the_beginning() {
    let mut app = plain_app("one two");
    app.set_position(2);

    assert!(app.play(1_000));
    assert_eq!(app.position(), 0);
}

#[test]
fn replaying_replaces_the_pending_step() {
    let mut app = plain_app("one two three");
    app.play(0);
    app.play(100);

    assert_eq!(app.next_step_ms(), Some(300));
    app.tick(200);
    assert_eq!(app.position(), 0);
}

#[test]
fn empty_document_or_ingestion_blocks_play() {
    let mut app = plain_app("   ");
    assert!(!app.play(0));

    let mut app = plain_app("some words");
    app.begin_ingestion();
    assert!(!app.play(0));
    press(&mut app, InputEvent::TogglePlayback, 10);
    assert_eq!(app.playback(), PlaybackState::Stopped);
}

#[test]
fn failed_ingestion_keeps_previous_document() {
    let mut app = plain_app("keep this text");
    app.set_position(2);
    app.begin_ingestion();

    let result = app.finish_ingestion(Err(IngestionError::NoSections));

    assert_eq!(result, Err(IngestionError::NoSections));
    assert!(!app.is_ingesting());
    assert_eq!(app.document().text, "keep this text");
    assert_eq!(app.position(), 2);
}

#[test]
fn new_document_resets_position_and_requests_save() {
    let mut app = plain_app("first document here");
    app.set_position(2);
    app.begin_ingestion();

    app.finish_ingestion(Ok(Document::plain("second one"))).unwrap();

    assert_eq!(app.position(), 0);
    assert_eq!(app.total_words(), 2);
    assert_eq!(app.take_save_request(), Some(SaveReason::DocumentLoaded));
}

#[test]
fn page_view_is_derived_from_word_position() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.set_position(5);

    app.switch_mode(ViewMode::Paginated);

    let page = app.page_view();
    assert_eq!(page.chapter_index, 1);
    assert_eq!(page.scroll_percentage, 25.0);
    assert_eq!(page.highlight, Some(5));
    assert_eq!(app.take_save_request(), Some(SaveReason::ModeSwitch));
}

#[test]
fn scrolling_never_moves_the_reading_position() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.set_position(5);
    app.switch_mode(ViewMode::Paginated);

    app.page_scrolled(90.0);
    assert_eq!(app.position(), 5);
    assert_eq!(app.word_at_scroll(), Some(7));

    app.switch_mode(ViewMode::WordAtATime);
    assert_eq!(app.position(), 5);
    assert_eq!(app.page_view().highlight, None);
}

#[test]
fn word_tap_moves_position_and_highlight() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.switch_mode(ViewMode::Paginated);
    let _ = app.take_save_request();

    press(&mut app, InputEvent::SelectWord(6), 0);

    assert_eq!(app.position(), 6);
    assert_eq!(app.page_view().highlight, Some(6));
    assert_eq!(app.page_view().chapter_index, 1);
    assert_eq!(app.take_save_request(), Some(SaveReason::Navigation));

    app.switch_mode(ViewMode::WordAtATime);
    assert_eq!(app.position(), 6);
}

#[test]
fn out_of_range_tap_is_ignored() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.select_word(8);

    assert_eq!(app.position(), 0);
    assert_eq!(app.take_save_request(), None);
}

#[test]
fn entering_page_view_pauses_playback() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.play(0);
    app.tick(200);

    app.switch_mode(ViewMode::Paginated);

    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.next_step_ms(), None);
    assert_eq!(app.page_view().highlight, Some(1));
}

#[test]
fn chapter_and_document_jumps() {
    let mut app = loaded(two_chapter_document(), Settings::default());

    assert!(app.navigate_to_chapter(1));
    assert_eq!(app.position(), 4);
    assert!(!app.navigate_to_chapter(2));

    app.jump_to_percentage(50.0);
    assert_eq!(app.position(), 4);
    app.jump_to_percentage(100.0);
    assert_eq!(app.position(), 7);

    app.jump_to_word_number(3);
    assert_eq!(app.position(), 2);
    assert_eq!(app.take_save_request(), Some(SaveReason::Navigation));
}

#[test]
fn manual_steps_stay_inside_the_document() {
    let mut app = plain_app("one two three");

    app.advance();
    app.advance();
    app.advance();
    assert_eq!(app.position(), 2);

    app.rewind(5);
    assert_eq!(app.position(), 0);
}

#[test]
fn rewind_pauses_running_playback() {
    let mut app = plain_app(&numbered_words(10));
    app.set_position(6);
    app.play(0);

    app.rewind(3);

    assert_eq!(app.position(), 3);
    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.take_save_request(), Some(SaveReason::Pause));
}

#[test]
fn rewind_tap_steps_back_once_and_stays_paused() {
    let mut app = plain_app(&numbered_words(10));
    app.play(0);
    app.tick(200);
    app.tick(400);
    assert_eq!(app.position(), 2);

    press(&mut app, InputEvent::RewindPressed, 450);
    assert_eq!(app.pause_cause(), Some(PauseCause::Rewind));
    press(&mut app, InputEvent::RewindReleased, 500);

    assert_eq!(app.position(), 1);
    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.pause_cause(), Some(PauseCause::User));
    app.tick(5_000);
    assert_eq!(app.position(), 1);
}

#[test]
fn rewind_hold_repeats_and_resumes_on_release() {
    let mut app = plain_app(&numbered_words(30));
    app.set_position(20);
    app.play(0);

    press(&mut app, InputEvent::RewindPressed, 0);
    app.tick(199);
    assert_eq!(app.position(), 20);
    app.tick(200);
    assert_eq!(app.position(), 19);
    app.tick(450);
    assert_eq!(app.position(), 18);
    app.tick(700);
    app.tick(950);
    app.tick(1_200);
    assert_eq!(app.position(), 15);
    app.tick(1_325);
    assert_eq!(app.position(), 14);

    press(&mut app, InputEvent::RewindReleased, 1_400);

    assert_eq!(app.position(), 14);
    assert_eq!(app.playback(), PlaybackState::Playing);
    assert_eq!(app.next_step_ms(), Some(1_600));
}

#[test]
fn rewind_hold_speeds_up_in_tiers() {
    assert_eq!(rewind_interval_ms(0), 250);
    assert_eq!(rewind_interval_ms(999), 250);
    assert_eq!(rewind_interval_ms(1_000), 125);
    assert_eq!(rewind_interval_ms(2_499), 125);
    assert_eq!(rewind_interval_ms(2_500), 60);
    assert_eq!(rewind_interval_ms(60_000), 60);
}

#[test]
fn available_image_pauses_then_resumes() {
    let mut app = loaded(illustrated_document(&["pic.png".into()]), Settings::default());
    app.play(0);
    app.tick(200);
    app.tick(400);
    assert!(app.current_token().is_some_and(Token::is_paragraph_break));
    app.tick(900);

    assert_eq!(app.position(), 3);
    assert_eq!(app.pause_cause(), Some(PauseCause::Image));
    assert_eq!(app.current_image().map(|image| image.alt_text.as_str()), Some("Pic"));

    app.tick(3_899);
    assert_eq!(app.playback(), PlaybackState::Paused);
    app.tick(3_900);
    assert_eq!(app.playback(), PlaybackState::Playing);
    assert_eq!(app.next_step_ms(), Some(4_200));
    app.tick(4_200);
    assert_eq!(app.position(), 4);
}

#[test]
fn unavailable_image_never_pauses() {
    let mut app = loaded(illustrated_document(&[]), Settings::default());
    app.play(0);
    app.tick(200);
    app.tick(400);
    app.tick(900);

    assert_eq!(app.position(), 3);
    assert_eq!(app.playback(), PlaybackState::Playing);
    assert_eq!(app.current_image(), None);
}

#[test]
fn image_pause_can_be_disabled() {
    let settings = Settings {
        image_pause_enabled: false,
        ..Settings::default()
    };
    let mut app = loaded(illustrated_document(&["pic.png".into()]), settings);
    app.play(0);
    app.tick(200);
    app.tick(400);
    app.tick(900);

    assert_eq!(app.playback(), PlaybackState::Playing);
}

#[test]
fn periodic_pause_interjects_and_resumes() {
    let settings = Settings {
        periodic_pause_interval: 2,
        periodic_pause_ms: 1_000,
        ..Settings::default()
    };
    let mut app = loaded(Document::plain("a b c d e"), settings);
    app.play(0);
    app.tick(200);
    app.tick(400);

    assert_eq!(app.position(), 2);
    assert_eq!(app.pause_cause(), Some(PauseCause::Periodic));
    app.tick(1_400);
    assert_eq!(app.playback(), PlaybackState::Playing);
    app.tick(1_600);
    assert_eq!(app.position(), 3);
}

/// Reader waiting on the picture at index 3; it would resume at 3900.
fn paused_on_image() -> ReaderApp<MockInput> {
    let mut app = loaded(illustrated_document(&["pic.png".into()]), Settings::default());
    app.play(0);
    app.tick(200);
    app.tick(400);
    app.tick(900);
    assert_eq!(app.pause_cause(), Some(PauseCause::Image));
    app
}

#[test]
fn page_view_cancels_pending_image_resume() {
    let mut app = paused_on_image();

    app.switch_mode(ViewMode::Paginated);
    app.tick(4_000);

    assert_eq!(app.view_mode(), ViewMode::Paginated);
    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.pause_cause(), Some(PauseCause::User));
    assert_eq!(app.page_view().highlight, Some(3));
}

#[test]
fn visibility_loss_cancels_pending_image_resume() {
    let mut app = paused_on_image();

    app.visibility_lost();
    app.tick(4_000);

    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.pause_cause(), Some(PauseCause::User));
    assert_eq!(app.take_save_request(), Some(SaveReason::VisibilityLost));
}

#[test]
fn manual_rewind_during_image_pause_stays_paused() {
    let mut app = paused_on_image();

    app.rewind(2);
    app.tick(4_000);

    assert_eq!(app.position(), 1);
    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.next_step_ms(), None);
}

#[test]
fn rewind_hold_during_image_pause_only_moves_backwards() {
    let mut app = paused_on_image();

    press(&mut app, InputEvent::RewindPressed, 1_000);
    assert_eq!(app.pause_cause(), Some(PauseCause::Rewind));
    app.tick(1_200);
    assert_eq!(app.position(), 2);
    app.tick(3_900);
    app.tick(4_000);

    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.next_step_ms(), None);
    assert!(app.position() < 2);

    press(&mut app, InputEvent::RewindReleased, 4_100);
    assert_eq!(app.playback(), PlaybackState::Playing);
}

#[test]
fn autosave_fires_while_playing_only() {
    let mut app = plain_app(&numbered_words(200));
    app.play(0);

    let mut now = 0;
    while now < AUTOSAVE_INTERVAL_MS {
        now += 200;
        app.tick(now);
    }
    assert_eq!(app.take_save_request(), Some(SaveReason::Autosave));

    app.pause(now);
    assert_eq!(app.take_save_request(), Some(SaveReason::Pause));
    app.tick(now + 3 * AUTOSAVE_INTERVAL_MS);
    assert_eq!(app.take_save_request(), None);
}

#[test]
fn autosave_runs_while_auto_scrolling() {
    let mut app = plain_app("a few words");
    app.set_auto_scrolling(true, 0);

    app.tick(AUTOSAVE_INTERVAL_MS);
    assert_eq!(app.take_save_request(), Some(SaveReason::Autosave));

    app.set_auto_scrolling(false, AUTOSAVE_INTERVAL_MS);
    app.tick(3 * AUTOSAVE_INTERVAL_MS);
    assert_eq!(app.take_save_request(), None);
}

#[test]
fn stop_cancels_every_timer_and_keeps_position() {
    let mut app = plain_app(&numbered_words(20));
    app.play(0);
    app.tick(200);
    app.tick(400);
    press(&mut app, InputEvent::RewindPressed, 450);

    press(&mut app, InputEvent::Stop, 460);

    assert_eq!(app.playback(), PlaybackState::Stopped);
    assert_eq!(app.next_step_ms(), None);
    assert_eq!(app.position(), 2);
    app.tick(60_000);
    assert_eq!(app.position(), 2);
    assert_eq!(app.take_save_request(), Some(SaveReason::Stop));
}

#[test]
fn toggle_and_speed_inputs() {
    let mut app = plain_app(&numbered_words(5));

    press(&mut app, InputEvent::TogglePlayback, 0);
    assert_eq!(app.playback(), PlaybackState::Playing);
    press(&mut app, InputEvent::TogglePlayback, 50);
    assert_eq!(app.playback(), PlaybackState::Paused);

    press(&mut app, InputEvent::SpeedUp, 60);
    assert_eq!(app.settings().wpm, 310);
    assert_eq!(app.take_save_request(), Some(SaveReason::SettingsChanged));
}

#[test]
fn visibility_loss_pauses_and_requests_save() {
    let mut app = plain_app(&numbered_words(5));
    app.play(0);

    press(&mut app, InputEvent::VisibilityLost, 100);

    assert_eq!(app.playback(), PlaybackState::Paused);
    assert_eq!(app.take_save_request(), Some(SaveReason::VisibilityLost));
}

#[test]
fn frame_groups_words_within_a_paragraph() {
    let settings = Settings {
        frame_size: 3,
        ..Settings::default()
    };
    let mut app = loaded(Document::plain("one two\nthree four five six"), settings);
    app.set_position(1);

    let words = app
        .current_frame()
        .iter()
        .map(|token| token.text.as_str())
        .collect::<Vec<_>>();
    assert_eq!(words, ["two"]);

    app.set_position(3);
    assert_eq!(app.current_frame().len(), 3);
}

#[test]
fn progress_label_follows_mode() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.set_position(5);
    assert_eq!(app.chapter_progress_label().as_deref(), Some("25%"));

    let mut settings = app.settings().clone();
    settings.chapter_progress = ChapterProgressMode::WordsLeft;
    app.apply_settings(settings.clone());
    assert_eq!(app.chapter_progress_label().as_deref(), Some("3 words left"));

    settings.chapter_progress = ChapterProgressMode::Off;
    app.apply_settings(settings);
    assert_eq!(app.chapter_progress_label(), None);
}

#[test]
fn session_round_trip_restores_structure_and_view() {
    let mut app = loaded(two_chapter_document(), Settings::default());
    app.set_position(6);
    app.switch_mode(ViewMode::Paginated);
    let session = app.snapshot_session(1_234);
    assert_eq!(session.current_chapter_index, 1);
    assert_eq!(session.scroll_percentage, 50.0);

    let json = session.to_json().unwrap();
    let mut restored = ReaderApp::new(MockInput::new(), Settings::default());
    restored.restore_session(Session::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.position(), 6);
    assert_eq!(restored.view_mode(), ViewMode::Paginated);
    assert_eq!(restored.page_view(), app.page_view());
    assert_eq!(restored.document().structure, app.document().structure);
    assert!(
        restored.document().structure.chapters[1]
            .renderable_content
            .contains("data-word=\"6\"")
    );
    assert_eq!(restored.take_save_request(), None);
}

#[test]
fn plain_session_rebuilds_from_text() {
    let mut app = plain_app("alpha beta\ngamma");
    app.set_position(3);
    let session = app.snapshot_session(0);
    assert!(session.document_structure.is_none());

    let mut restored = ReaderApp::new(MockInput::new(), Settings::default());
    restored.restore_session(session).unwrap();

    assert_eq!(restored.position(), 3);
    assert_eq!(restored.current_token().map(|t| t.text.as_str()), Some("gamma"));
}

#[test]
fn broken_session_leaves_state_untouched() {
    let mut app = plain_app("alpha beta gamma");
    app.set_position(2);

    let mut broken = loaded(two_chapter_document(), Settings::default()).snapshot_session(0);
    if let Some(structure) = broken.document_structure.as_mut() {
        structure.chapters[1].word_count = 99;
    }
    assert_eq!(app.restore_session(broken), Err(RestoreError::BrokenStructure));

    let mut mismatched = loaded(two_chapter_document(), Settings::default()).snapshot_session(0);
    mismatched.total_words = 3;
    assert_eq!(app.restore_session(mismatched), Err(RestoreError::BrokenStructure));

    let mut empty = app.snapshot_session(0);
    empty.document_text = "  ".into();
    assert_eq!(app.restore_session(empty), Err(RestoreError::EmptyDocument));

    let blank = Document::from_structure(structure(
        &[Section::text("blank.txt", " \n\t ")],
        None,
        &[],
        SectionLayout::Logical,
    ));
    let wordless = loaded(blank, Settings::default()).snapshot_session(0);
    assert_eq!(wordless.total_words, 0);
    assert_eq!(app.restore_session(wordless), Err(RestoreError::EmptyDocument));

    assert_eq!(app.document().text, "alpha beta gamma");
    assert_eq!(app.position(), 2);
}

#[test]
fn fresh_reader_shows_placeholder() {
    let app = ReaderApp::new(MockInput::new(), Settings::default());

    assert_eq!(app.document().text, crate::content::PLACEHOLDER_TEXT);
    assert!(app.total_words() > 0);
}
