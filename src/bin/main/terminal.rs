//! Line-oriented renderer: one output line per displayed frame, with the
//! focal letter of the lead word pinned to a fixed column.

use core::fmt::Write as _;

use heapless::String as HeaplessString;
use swiftread_core::{
    app::ReaderApp, input::InputProvider, position::chapter_at,
    text_policy::section_secondary_label, timing::split_at_orp,
};

pub(super) const ORP_ANCHOR_PERCENT: usize = 42;
pub(super) const DEFAULT_COLUMNS: usize = 72;
const STATUS_BYTES: usize = 64;

/// Render the current frame, or `None` when there is nothing to show.
///
/// A paragraph break renders as an empty line.
pub(super) fn render_line<IN>(app: &ReaderApp<IN>, columns: usize) -> Option<String>
where
    IN: InputProvider,
{
    if let Some(image) = app.current_image() {
        let alt = if image.alt_text.is_empty() {
            image.source_ref.as_str()
        } else {
            image.alt_text.as_str()
        };
        return Some(format!("[image: {alt}]"));
    }

    let token = app.current_token()?;
    if token.is_paragraph_break() {
        return Some(String::new());
    }

    let frame = app.current_frame();
    let (lead, rest) = frame.split_first()?;
    let (before, focal, after) = split_at_orp(&lead.text);

    let anchor = columns.saturating_mul(ORP_ANCHOR_PERCENT) / 100;
    let indent = anchor.saturating_sub(before.chars().count());
    let mut line = String::with_capacity(columns);
    line.extend(core::iter::repeat_n(' ', indent));
    line.push_str(before);
    line.push('[');
    line.push_str(focal);
    line.push(']');
    line.push_str(after);
    for word in rest {
        line.push(' ');
        line.push_str(&word.text);
    }

    let status = status_line(app);
    if !status.is_empty() {
        line.push_str("    ");
        line.push_str(&status);
    }
    Some(line)
}

fn status_line<IN>(app: &ReaderApp<IN>) -> HeaplessString<STATUS_BYTES>
where
    IN: InputProvider,
{
    let mut status = HeaplessString::new();
    // overflow only truncates the status text
    let _ = write!(
        status,
        "({} wpm, {}/{}",
        app.settings().wpm,
        app.position().saturating_add(1),
        app.total_words()
    );
    let structure = &app.document().structure;
    if structure.chapters.len() > 1 {
        let chapter = chapter_at(structure, app.position());
        let _ = write!(
            status,
            ", {}",
            section_secondary_label(chapter + 1, structure.chapters.len(), "ch")
        );
    }
    if let Some(label) = app.chapter_progress_label() {
        let _ = write!(status, ", {label}");
    }
    let _ = status.push(')');
    status
}
