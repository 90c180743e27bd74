use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::debug;

use super::{Scheduler, TickHandle};
use crate::event::{Event, EventSender};

/// Periodic callbacks backed by tokio tasks.
///
/// Each handle owns one task that posts `Event::Tick(id)` into the
/// controller's channel. Must be used from inside a tokio runtime.
pub struct TokioScheduler {
    events: EventSender,
    next_id: u64,
    tasks: HashMap<u64, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    pub fn active(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, period: Duration) -> TickHandle {
        self.next_id += 1;
        let id = self.next_id;
        let events = self.events.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(Event::Tick(id)).is_err() {
                    break;
                }
            }
        });

        debug!(tick = id, ?period, "scheduled ticker");
        self.tasks.insert(id, task);
        TickHandle::new(id)
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(task) = self.tasks.remove(&handle.id()) {
            task.abort();
            debug!(tick = handle.id(), "cancelled ticker");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::create_event_channel;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let (tx, mut rx) = create_event_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let handle = scheduler.schedule(Duration::from_secs(1));
        let id = handle.id();

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut ticks = 0;
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event, Event::Tick(id));
            ticks += 1;
        }
        assert_eq!(ticks, 3);

        scheduler.cancel(handle);
        assert_eq!(scheduler.active(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks() {
        let (tx, mut rx) = create_event_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let handle = scheduler.schedule(Duration::from_secs(1));
        scheduler.cancel(handle);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handles_are_distinct() {
        let (tx, _rx) = create_event_channel();
        let mut scheduler = TokioScheduler::new(tx);
        let first = scheduler.schedule(Duration::from_secs(1));
        let second = scheduler.schedule(Duration::from_secs(1));
        assert_ne!(first.id(), second.id());
        assert_eq!(scheduler.active(), 2);
    }
}
