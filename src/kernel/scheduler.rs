use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::event::Event;
use super::time::Clock;

/// Background poll for time-based triggers. It only enqueues
/// `ProactiveTick`; the single consumer does the work, so timers,
/// alarms and the pending slot are never touched from two tasks.
pub struct ProactiveLoop {
    events: mpsc::Sender<Event>,
    clock: Arc<dyn Clock>,
    period: Duration,
    cancel: CancellationToken,
}

impl ProactiveLoop {
    pub fn new(events: mpsc::Sender<Event>, clock: Arc<dyn Clock>, period: Duration, cancel: CancellationToken) -> Self {
        Self { events, clock, period, cancel }
    }

    pub async fn run(self) {
        info!("Proactive loop started. Period: {:?}", self.period);

        let mut cadence = interval(self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = cadence.tick() => {
                    if self.events.send(Event::ProactiveTick(self.clock.now())).await.is_err() {
                        break;
                    }
                }
            }
        }
        info!("Proactive loop stopped");
    }
}
