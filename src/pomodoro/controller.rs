use std::time::Duration;
use tracing::{debug, info, warn};

use super::state::{Configuration, CountdownState, Phase, RunState, TICK_INTERVAL_MS};
use crate::event::InputEvent;
use crate::host::{AudioPlayer, DisplaySurface, Element, Scheduler, Style, TickHandle};
use crate::render::{self, CIRCUMFERENCE};

/// The Pomodoro state machine.
///
/// Idle or Running, crossed with Work or Break. The controller is Running
/// exactly while it holds a [`TickHandle`]; every way back to Idle goes
/// through [`TimerController::release_tick`].
pub struct TimerController<D, S, A> {
    surface: D,
    scheduler: S,
    audio: A,
    config: Configuration,
    countdown: CountdownState,
    tick: Option<TickHandle>,
}

impl<D, S, A> TimerController<D, S, A>
where
    D: DisplaySurface,
    S: Scheduler,
    A: AudioPlayer,
{
    pub fn new(config: Configuration, surface: D, scheduler: S, audio: A) -> Self {
        let mut controller = Self {
            surface,
            scheduler,
            audio,
            config,
            countdown: CountdownState::new(Phase::Work, config.seconds_for(Phase::Work)),
            tick: None,
        };
        controller.surface.set_style(
            Element::ProgressRing,
            Style::StrokeDasharray(CIRCUMFERENCE),
        );
        controller.redraw(1.0);
        controller
    }

    pub fn run_state(&self) -> RunState {
        if self.tick.is_some() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    pub fn countdown(&self) -> &CountdownState {
        &self.countdown
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn surface(&self) -> &D {
        &self.surface
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn dispatch(&mut self, input: InputEvent) {
        match input {
            InputEvent::Toggle => self.toggle_start(),
            InputEvent::Reset => self.reset(),
            InputEvent::SwitchMode { phase } => self.switch_mode(phase),
            InputEvent::DurationChanged { phase, minutes } => {
                self.on_duration_changed(phase, minutes)
            }
        }
    }

    pub fn toggle_start(&mut self) {
        match self.run_state() {
            RunState::Idle => self.start_timer(),
            RunState::Running => self.pause_timer(),
        }
    }

    fn start_timer(&mut self) {
        self.release_tick();
        let handle = self
            .scheduler
            .schedule(Duration::from_millis(TICK_INTERVAL_MS));
        info!(
            phase = self.countdown.phase().as_str(),
            remaining = self.countdown.remaining_seconds(),
            tick = handle.id(),
            "timer started"
        );
        self.tick = Some(handle);
        self.redraw(self.countdown.fraction());
    }

    fn pause_timer(&mut self) {
        self.release_tick();
        info!(
            phase = self.countdown.phase().as_str(),
            remaining = self.countdown.remaining_seconds(),
            "timer paused"
        );
        self.redraw(self.countdown.fraction());
    }

    pub fn reset(&mut self) {
        self.release_tick();
        self.countdown = CountdownState::new(Phase::Work, self.config.seconds_for(Phase::Work));
        info!(total = self.countdown.total_seconds(), "timer reset");
        self.redraw(1.0);
    }

    pub fn switch_mode(&mut self, phase: Phase) {
        if self.run_state() == RunState::Running {
            debug!(phase = phase.as_str(), "mode switch ignored while running");
            return;
        }
        self.countdown = CountdownState::new(phase, self.config.seconds_for(phase));
        self.redraw(1.0);
    }

    pub fn on_duration_changed(&mut self, phase: Phase, minutes: i64) {
        if self.run_state() == RunState::Running {
            debug!(
                phase = phase.as_str(),
                minutes, "duration edit ignored while running"
            );
            // Put the retained values back into the inputs.
            self.redraw(self.countdown.fraction());
            return;
        }
        self.config.set_minutes(phase, minutes);
        let current = self.countdown.phase();
        self.countdown = CountdownState::new(current, self.config.seconds_for(current));
        debug!(
            phase = phase.as_str(),
            minutes = self.config.minutes(phase),
            "duration updated"
        );
        self.redraw(1.0);
    }

    /// Entry point for the host's periodic callback. Ticks from a handle
    /// that has already been cancelled are dropped.
    pub fn handle_tick(&mut self, id: u64) {
        if self.tick.as_ref().map(TickHandle::id) == Some(id) {
            self.on_tick();
        } else {
            debug!(tick = id, "dropping stale tick");
        }
    }

    fn on_tick(&mut self) {
        let remaining = self.countdown.tick_down();
        self.redraw(self.countdown.fraction());
        if remaining == 0 {
            self.on_phase_complete();
        }
    }

    fn on_phase_complete(&mut self) {
        let finished = self.countdown.phase();
        let next = finished.opposite();

        self.audio.seek_to_start();
        if let Err(error) = self.audio.play() {
            warn!(%error, "failed to play notification sound");
        }

        self.countdown = CountdownState::new(next, self.config.seconds_for(next));
        let message = match finished {
            Phase::Work => format!(
                "Work session complete! Time for a {}-minute break.",
                self.config.minutes(Phase::Break)
            ),
            Phase::Break => format!(
                "Break is over! Starting {}-minute work session.",
                self.config.minutes(Phase::Work)
            ),
        };
        info!("{} {}", next.emoji(), message);
        self.redraw(1.0);
    }

    fn release_tick(&mut self) {
        if let Some(handle) = self.tick.take() {
            debug!(tick = handle.id(), "releasing tick");
            self.scheduler.cancel(handle);
        }
    }

    fn redraw(&mut self, fraction: f64) {
        render::render(&self.countdown, self.run_state(), fraction, &self.config)
            .apply(&mut self.surface);
    }
}
