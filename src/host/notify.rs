use chrono::Local;
#[cfg(all(unix, not(target_os = "macos")))]
use notify_rust::Hint;
use notify_rust::Notification;
use std::io::{self, Write};
use tracing::warn;

use super::{AudioError, AudioPlayer};

const SUMMARY: &str = "Ring Pomodoro";
pub const SOUND_NAME: &str = "complete";

/// Phase-end cue: the terminal bell plus a desktop notification.
///
/// A notification always plays from the top, so `seek_to_start` keeps the
/// default no-op.
pub struct NotifyAudio {
    bell: bool,
    desktop: bool,
}

impl NotifyAudio {
    pub fn new(bell: bool, desktop: bool) -> Self {
        Self { bell, desktop }
    }
}

impl Default for NotifyAudio {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Builds the desktop notification shown when a phase ends.
pub fn phase_end_notification() -> Notification {
    let mut notification = Notification::new();
    notification
        .summary(SUMMARY)
        .body(&format!(
            "Phase finished at {}",
            Local::now().format("%H:%M:%S")
        ))
        .timeout(0); // No auto-dismiss

    #[cfg(all(unix, not(target_os = "macos")))]
    notification.hint(Hint::SoundName(SOUND_NAME.to_string()));
    #[cfg(not(all(unix, not(target_os = "macos"))))]
    notification.sound_name(SOUND_NAME);

    notification
}

fn show_notification(notification: Notification) {
    if let Err(e) = notification.show() {
        warn!(error = %e, "failed to show desktop notification");
    }
}

impl AudioPlayer for NotifyAudio {
    fn play(&mut self) -> Result<(), AudioError> {
        if self.bell {
            let mut out = io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
        if self.desktop {
            let notification = phase_end_notification();
            // `show` waits on the notification server; keep it off the
            // task that handles ticks.
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    runtime.spawn_blocking(move || show_notification(notification));
                }
                Err(_) => {
                    notification.show()?;
                }
            }
        }
        Ok(())
    }
}
