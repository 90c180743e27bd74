use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::pomodoro::Phase;

/// User actions, whether typed on stdin or sent by a WebSocket client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Toggle,
    Reset,
    SwitchMode { phase: Phase },
    DurationChanged { phase: Phase, minutes: i64 },
}

/// Everything the controller loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Input(InputEvent),
    Tick(u64),
    Shutdown,
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),
    #[error("invalid minutes {value:?}: {source}")]
    InvalidMinutes {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub fn parse_json_event(text: &str) -> Result<InputEvent, InputError> {
    Ok(serde_json::from_str(text)?)
}
