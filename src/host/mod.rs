//! Collaborators the controller consumes: a display surface, a periodic
//! tick source and an audio cue.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub mod notify;
pub mod scheduler;
pub mod terminal;

pub use notify::NotifyAudio;
pub use scheduler::TokioScheduler;
pub use terminal::TerminalSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    TimeDisplay,
    ProgressRing,
    StartButton,
    WorkModeButton,
    BreakModeButton,
    WorkInput,
    BreakInput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "property", content = "value", rename_all = "snake_case")]
pub enum Style {
    StrokeDasharray(f64),
    StrokeDashoffset(f64),
    Transform(String),
}

pub trait DisplaySurface {
    fn set_text(&mut self, element: Element, text: &str);
    fn set_style(&mut self, element: Element, style: Style);
    fn toggle_class(&mut self, element: Element, class: &str, enabled: bool);

    /// Called once after every complete frame of updates.
    fn present(&mut self) {}
}

/// Handle to an active periodic callback.
///
/// Not `Clone`: cancelling consumes it, so a handle can only be released
/// once.
#[derive(Debug, PartialEq, Eq)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait Scheduler {
    fn schedule(&mut self, interval: Duration) -> TickHandle;
    fn cancel(&mut self, handle: TickHandle);
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("notification failed: {0}")]
    Notify(#[from] notify_rust::error::Error),
    #[error("audio output failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("audio unavailable: {0}")]
    Unavailable(String),
}

pub trait AudioPlayer {
    /// Rewinds the cue so the next `play` starts from the beginning.
    fn seek_to_start(&mut self) {}
    fn play(&mut self) -> Result<(), AudioError>;
}
