use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use super::{DisplaySurface, Element, Style};
use crate::event::{Event, EventSender, InputError, InputEvent};
use crate::pomodoro::Phase;
use crate::render::{ACTIVE_CLASS, CIRCUMFERENCE, RUNNING_CLASS};

const BAR_WIDTH: usize = 20;

/// Draws the timer as a single, continuously rewritten status line.
pub struct TerminalSurface<W: Write> {
    out: W,
    time: String,
    remaining: f64,
    phase: Phase,
    running: bool,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            time: String::new(),
            remaining: 1.0,
            phase: Phase::Work,
            running: false,
        }
    }

    pub fn status_line(&self) -> String {
        let filled = (self.remaining * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        format!(
            "{} {:<5} {} [{}{}] {}",
            self.phase.emoji(),
            self.phase.as_str(),
            self.time,
            "#".repeat(filled),
            "-".repeat(BAR_WIDTH - filled),
            if self.running { "running" } else { "paused" }
        )
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn set_text(&mut self, element: Element, text: &str) {
        if element == Element::TimeDisplay {
            self.time = text.to_string();
        }
    }

    fn set_style(&mut self, element: Element, style: Style) {
        if let (Element::ProgressRing, Style::StrokeDashoffset(offset)) = (element, style) {
            self.remaining = 1.0 - offset / CIRCUMFERENCE;
        }
    }

    fn toggle_class(&mut self, element: Element, class: &str, enabled: bool) {
        match (element, class) {
            (Element::StartButton, RUNNING_CLASS) => self.running = enabled,
            (Element::WorkModeButton, ACTIVE_CLASS) if enabled => self.phase = Phase::Work,
            (Element::BreakModeButton, ACTIVE_CLASS) if enabled => self.phase = Phase::Break,
            _ => {}
        }
    }

    fn present(&mut self) {
        let line = self.status_line();
        if let Err(e) = write!(self.out, "\r\x1b[2K{}", line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to draw status line");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Input(InputEvent),
    Quit,
}

/// Parses one line typed at the prompt. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<TerminalCommand>, InputError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let command = command.to_lowercase();
    let argument = words.next();

    let phase = match command.as_str() {
        "work" | "w" => Some(Phase::Work),
        "break" | "b" => Some(Phase::Break),
        _ => None,
    };
    if let Some(phase) = phase {
        let event = match argument {
            Some(value) => InputEvent::DurationChanged {
                phase,
                minutes: value.parse().map_err(|source| InputError::InvalidMinutes {
                    value: value.to_string(),
                    source,
                })?,
            },
            None => InputEvent::SwitchMode { phase },
        };
        return Ok(Some(TerminalCommand::Input(event)));
    }

    let parsed = match command.as_str() {
        "s" | "start" | "pause" | "p" | "toggle" => TerminalCommand::Input(InputEvent::Toggle),
        "r" | "reset" => TerminalCommand::Input(InputEvent::Reset),
        "q" | "quit" | "exit" => TerminalCommand::Quit,
        _ => return Err(InputError::UnknownCommand(line.trim().to_string())),
    };
    Ok(Some(parsed))
}

/// What to do when the command stream runs dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnEof {
    /// Closing the terminal ends the session.
    Shutdown,
    /// Keep running; only `quit` or a signal stops the timer.
    Ignore,
}

/// Reads commands from stdin until EOF or `quit`.
pub async fn read_stdin_commands(events: EventSender, on_eof: OnEof) {
    forward_commands(BufReader::new(tokio::io::stdin()), events, on_eof).await;
}

pub async fn forward_commands<R>(reader: R, events: EventSender, on_eof: OnEof)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!(?on_eof, "command input closed");
                if on_eof == OnEof::Shutdown {
                    let _ = events.send(Event::Shutdown);
                }
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read commands");
                if on_eof == OnEof::Shutdown {
                    let _ = events.send(Event::Shutdown);
                }
                return;
            }
        };

        match parse_line(&line) {
            Ok(Some(TerminalCommand::Input(input))) => {
                debug!(?input, "terminal input");
                if events.send(Event::Input(input)).is_err() {
                    return;
                }
            }
            Ok(Some(TerminalCommand::Quit)) => {
                let _ = events.send(Event::Shutdown);
                return;
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "ignoring input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::create_event_channel;
    use crate::pomodoro::{Configuration, CountdownState, RunState};
    use crate::render::render;

    #[tokio::test]
    async fn test_closed_input_keeps_daemon_running() {
        let (tx, mut rx) = create_event_channel();
        forward_commands(&b""[..], tx, OnEof::Ignore).await;
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_closed_input_ends_terminal_session() {
        let (tx, mut rx) = create_event_channel();
        forward_commands(&b"start\n"[..], tx, OnEof::Shutdown).await;
        assert_eq!(rx.recv().await, Some(Event::Input(InputEvent::Toggle)));
        assert_eq!(rx.recv().await, Some(Event::Shutdown));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_quit_stops_even_when_eof_is_ignored() {
        let (tx, mut rx) = create_event_channel();
        forward_commands(&b"bogus\nquit\nreset\n"[..], tx, OnEof::Ignore).await;
        assert_eq!(rx.recv().await, Some(Event::Shutdown));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse_line("start").unwrap(),
            Some(TerminalCommand::Input(InputEvent::Toggle))
        );
        assert_eq!(
            parse_line("  R ").unwrap(),
            Some(TerminalCommand::Input(InputEvent::Reset))
        );
        assert_eq!(
            parse_line("break").unwrap(),
            Some(TerminalCommand::Input(InputEvent::SwitchMode {
                phase: Phase::Break
            }))
        );
        assert_eq!(
            parse_line("work 30").unwrap(),
            Some(TerminalCommand::Input(InputEvent::DurationChanged {
                phase: Phase::Work,
                minutes: 30
            }))
        );
        assert_eq!(parse_line("quit").unwrap(), Some(TerminalCommand::Quit));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse_line("work ten"),
            Err(InputError::InvalidMinutes { .. })
        ));
        assert!(matches!(
            parse_line("snooze"),
            Err(InputError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_status_line_follows_frames() {
        let config = Configuration::new(25, 5);
        let mut countdown = CountdownState::new(Phase::Break, 300);
        for _ in 0..150 {
            countdown.tick_down();
        }

        let mut surface = TerminalSurface::new(Vec::new());
        render(&countdown, RunState::Running, countdown.fraction(), &config).apply(&mut surface);

        assert_eq!(
            surface.status_line(),
            format!("☕ BREAK 02:30 [{}{}] running", "#".repeat(10), "-".repeat(10))
        );
        let written = String::from_utf8(surface.into_inner()).unwrap();
        assert!(written.ends_with("02:30 [##########----------] running"));
    }
}
