//! Pure view computation. [`render`] turns controller state into a
//! [`RenderCommand`]; only [`RenderCommand::apply`] touches a surface.

pub mod progress;

pub use progress::{CIRCUMFERENCE, Progress, progress};

use crate::host::{DisplaySurface, Element, Style};
use crate::pomodoro::{Configuration, CountdownState, Phase, RunState};

pub const ACTIVE_CLASS: &str = "active";
pub const RUNNING_CLASS: &str = "running";
pub const START_LABEL: &str = "start";
pub const PAUSE_LABEL: &str = "pause";

/// Formats seconds as zero-padded `MM:SS`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderCommand {
    pub time_text: String,
    pub progress: Progress,
    pub start_label: &'static str,
    pub running: bool,
    pub active_phase: Phase,
    pub work_minutes: u32,
    pub break_minutes: u32,
}

pub fn render(
    countdown: &CountdownState,
    run_state: RunState,
    fraction: f64,
    config: &Configuration,
) -> RenderCommand {
    let running = run_state == RunState::Running;
    RenderCommand {
        time_text: format_time(countdown.remaining_seconds()),
        progress: progress(fraction),
        start_label: if running { PAUSE_LABEL } else { START_LABEL },
        running,
        active_phase: countdown.phase(),
        work_minutes: config.minutes(Phase::Work),
        break_minutes: config.minutes(Phase::Break),
    }
}

impl RenderCommand {
    pub fn apply(&self, surface: &mut dyn DisplaySurface) {
        let Progress { offset, scale } = self.progress;

        surface.set_text(Element::TimeDisplay, &self.time_text);
        surface.set_style(Element::ProgressRing, Style::StrokeDashoffset(offset));
        surface.set_style(
            Element::ProgressRing,
            Style::Transform(progress::ring_transform(scale)),
        );
        surface.set_style(
            Element::TimeDisplay,
            Style::Transform(progress::text_transform(scale)),
        );

        surface.set_text(Element::StartButton, self.start_label);
        surface.toggle_class(Element::StartButton, RUNNING_CLASS, self.running);

        surface.toggle_class(
            Element::WorkModeButton,
            ACTIVE_CLASS,
            self.active_phase == Phase::Work,
        );
        surface.toggle_class(
            Element::BreakModeButton,
            ACTIVE_CLASS,
            self.active_phase == Phase::Break,
        );

        surface.set_text(Element::WorkInput, &self.work_minutes.to_string());
        surface.set_text(Element::BreakInput, &self.break_minutes.to_string());
        surface.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct OpLog(Vec<String>);

    impl DisplaySurface for OpLog {
        fn set_text(&mut self, element: Element, text: &str) {
            self.0.push(format!("text {:?} {}", element, text));
        }

        fn set_style(&mut self, element: Element, style: Style) {
            self.0.push(format!("style {:?} {:?}", element, style));
        }

        fn toggle_class(&mut self, element: Element, class: &str, enabled: bool) {
            self.0.push(format!("class {:?} {} {}", element, class, enabled));
        }

        fn present(&mut self) {
            self.0.push("present".to_string());
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(25 * 60), "25:00");
        assert_eq!(format_time(599), "09:59");
        assert_eq!(format_time(100 * 60 + 7), "100:07");
    }

    #[test]
    fn test_render_running_break() {
        let config = Configuration::new(25, 5);
        let countdown = CountdownState::new(Phase::Break, 300);
        let command = render(&countdown, RunState::Running, 1.0, &config);

        assert_eq!(command.time_text, "05:00");
        assert_eq!(command.start_label, PAUSE_LABEL);
        assert!(command.running);
        assert_eq!(command.active_phase, Phase::Break);
        assert_eq!(command.progress.offset, 0.0);
    }

    #[test]
    fn test_apply_writes_whole_frame() {
        let config = Configuration::new(1, 5);
        let countdown = CountdownState::new(Phase::Work, 60);
        let mut log = OpLog::default();
        render(&countdown, RunState::Idle, 1.0, &config).apply(&mut log);

        assert_eq!(log.0.first().map(String::as_str), Some("text TimeDisplay 01:00"));
        assert!(log.0.contains(&"text StartButton start".to_string()));
        assert!(log.0.contains(&"class StartButton running false".to_string()));
        assert!(log.0.contains(&"class WorkModeButton active true".to_string()));
        assert!(log.0.contains(&"class BreakModeButton active false".to_string()));
        assert!(log.0.contains(&"text BreakInput 5".to_string()));
        assert_eq!(log.0.last().map(String::as_str), Some("present"));
    }
}
