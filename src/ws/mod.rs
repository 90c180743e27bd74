//! Browser front end over WebSocket: frames go out as JSON display
//! operations, user actions come back as [`crate::event::InputEvent`]s.

use serde::Serialize;
use tokio::sync::watch;
use tracing::warn;

use crate::host::{DisplaySurface, Element, Style};

pub mod websocket_server;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DisplayOp {
    SetText {
        element: Element,
        text: String,
    },
    SetStyle {
        element: Element,
        style: Style,
    },
    ToggleClass {
        element: Element,
        class: String,
        enabled: bool,
    },
}

impl DisplayOp {
    /// Ops with the same key overwrite each other.
    fn key(&self) -> (Element, &str, &str) {
        match self {
            DisplayOp::SetText { element, .. } => (*element, "text", ""),
            DisplayOp::SetStyle { element, style } => (
                *element,
                "style",
                match style {
                    Style::StrokeDasharray(_) => "stroke_dasharray",
                    Style::StrokeDashoffset(_) => "stroke_dashoffset",
                    Style::Transform(_) => "transform",
                },
            ),
            DisplayOp::ToggleClass { element, class, .. } => (*element, "class", class.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Frame<'a> {
    ops: &'a [DisplayOp],
}

pub type FrameReceiver = watch::Receiver<String>;

/// Surface that keeps the latest value of every display property and
/// publishes the whole set to connected clients on each `present`, so a
/// client that joins late still gets a complete picture.
pub struct WsSurface {
    state: Vec<DisplayOp>,
    frames: watch::Sender<String>,
}

impl WsSurface {
    pub fn new() -> (Self, FrameReceiver) {
        let (frames, rx) = watch::channel(String::new());
        (
            Self {
                state: Vec::new(),
                frames,
            },
            rx,
        )
    }

    fn push(&mut self, op: DisplayOp) {
        match self.state.iter_mut().find(|known| known.key() == op.key()) {
            Some(known) => *known = op,
            None => self.state.push(op),
        }
    }
}

impl DisplaySurface for WsSurface {
    fn set_text(&mut self, element: Element, text: &str) {
        self.push(DisplayOp::SetText {
            element,
            text: text.to_string(),
        });
    }

    fn set_style(&mut self, element: Element, style: Style) {
        self.push(DisplayOp::SetStyle { element, style });
    }

    fn toggle_class(&mut self, element: Element, class: &str, enabled: bool) {
        self.push(DisplayOp::ToggleClass {
            element,
            class: class.to_string(),
            enabled,
        });
    }

    fn present(&mut self) {
        match serde_json::to_string(&Frame { ops: &self.state }) {
            Ok(json) => {
                self.frames.send_replace(json);
            }
            Err(e) => warn!(error = %e, "failed to encode frame"),
        }
    }
}
