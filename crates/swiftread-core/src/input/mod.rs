//! Input abstraction layer.

mod mock;

pub use mock::MockInput;

/// Logical actions consumed by the reader app.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputEvent {
    TogglePlayback,
    Stop,
    /// Rewind control went down; a quick release is a tap, a long one a hold.
    RewindPressed,
    RewindReleased,
    SpeedUp,
    SpeedDown,
    /// A word in the page view was tapped; carries its global index.
    SelectWord(usize),
    /// The reader is no longer on screen.
    VisibilityLost,
}

/// Polled input provider.
pub trait InputProvider {
    type Error;

    fn poll_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}
