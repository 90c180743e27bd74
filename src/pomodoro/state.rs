use serde::{Deserialize, Serialize};

pub const TICK_INTERVAL_MS: u64 = 1000; // One countdown step per second
pub const POMODORO_WORK_MINUTES: u32 = 25; // Default Pomodoro work time
pub const POMODORO_BREAK_MINUTES: u32 = 5; // Default Pomodoro break time
pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn opposite(self) -> Phase {
        match self {
            Phase::Work => Phase::Break,
            Phase::Break => Phase::Work,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Work => "WORK",
            Phase::Break => "BREAK",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Phase::Work => "💼",
            Phase::Break => "☕",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Work and break lengths in whole minutes.
///
/// Every value that enters goes through [`clamp_minutes`], so a phase is
/// never shorter than one minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    work_minutes: u32,
    break_minutes: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            work_minutes: POMODORO_WORK_MINUTES,
            break_minutes: POMODORO_BREAK_MINUTES,
        }
    }
}

impl Configuration {
    pub fn new(work_minutes: i64, break_minutes: i64) -> Self {
        Self {
            work_minutes: clamp_minutes(work_minutes),
            break_minutes: clamp_minutes(break_minutes),
        }
    }

    pub fn minutes(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::Break => self.break_minutes,
        }
    }

    pub fn seconds_for(&self, phase: Phase) -> u32 {
        self.minutes(phase) * 60
    }

    pub fn set_minutes(&mut self, phase: Phase, minutes: i64) {
        let minutes = clamp_minutes(minutes);
        match phase {
            Phase::Work => self.work_minutes = minutes,
            Phase::Break => self.break_minutes = minutes,
        }
    }
}

pub fn clamp_minutes(minutes: i64) -> u32 {
    minutes.clamp(MIN_MINUTES as i64, MAX_MINUTES as i64) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    phase: Phase,
    remaining_seconds: u32,
    total_seconds: u32,
}

impl CountdownState {
    pub fn new(phase: Phase, total_seconds: u32) -> Self {
        Self {
            phase,
            remaining_seconds: total_seconds,
            total_seconds,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// Remaining share of the phase, 1.0 when untouched.
    pub fn fraction(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        f64::from(self.remaining_seconds) / f64::from(self.total_seconds)
    }

    /// Counts down one second and returns the seconds left.
    pub fn tick_down(&mut self) -> u32 {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        self.remaining_seconds
    }
}
