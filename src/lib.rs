//! Pomodoro countdown with an animated progress ring.
//!
//! [`pomodoro::TimerController`] is the whole state machine. It talks to
//! the outside world only through the traits in [`host`], so the same
//! controller drives a terminal status line, a WebSocket-connected page,
//! or the recording fakes in the tests.

pub mod event;
pub mod host;
pub mod pomodoro;
pub mod render;
pub mod ws;
