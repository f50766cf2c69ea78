use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::dispatcher::Dispatcher;
use super::event::{Event, InputEvent};
use super::presence::{Admission, Presence, PresenceRequest};
use super::telemetry::{DropReason, TelemetryEvent};
use super::time::Clock;

/// Single consumer of the event queue. Owns the presence gate and the
/// dispatcher; events are handled one at a time in arrival order, so a
/// reply that is still streaming finishes before the next utterance.
pub struct Reactor {
    receiver: mpsc::Receiver<Event>,
    presence: Presence,
    dispatcher: Dispatcher,
    clock: Arc<dyn Clock>,
    started: Instant,
}

impl Reactor {
    pub fn new(receiver: mpsc::Receiver<Event>, presence: Presence, dispatcher: Dispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            receiver,
            presence,
            dispatcher,
            clock,
            started: Instant::now(),
        }
    }

    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Handle one event. `false` once shutdown was requested.
    pub async fn step(&mut self, event: Event) -> bool {
        let now = self.clock.now();
        match event {
            Event::Input(input) => self.on_input(input).await,
            Event::Speaker(status) => {
                debug!("Speaker {:?}", status);
                self.presence.apply(PresenceRequest::Speaker(status), now);
            }
            Event::ProactiveTick(at) => {
                self.presence.apply(PresenceRequest::Poll, at);
                self.dispatcher.on_tick(at).await;
            }
            Event::Shutdown => return false,
        }
        true
    }

    async fn on_input(&mut self, input: InputEvent) {
        let now = self.clock.now();
        match self.presence.admit(&input.text, now) {
            Admission::Accepted(text) => {
                if text.is_empty() && self.dispatcher.dialogue().is_idle() {
                    debug!("Wake word only, listening");
                    self.dispatcher.telemetry_mut().record(TelemetryEvent::Dropped { reason: DropReason::Empty });
                    return;
                }
                info!("Utterance from {}: '{}'", input.source, text);
                self.dispatcher.handle(input.id, &text, now).await;
            }
            Admission::NoWakeWord => {
                debug!("Ignoring utterance without wake word");
                self.dispatcher.telemetry_mut().record(TelemetryEvent::Dropped { reason: DropReason::NoWakeWord });
            }
            Admission::Busy => {
                info!("Busy speaking, dropping utterance {}", input.id);
                self.dispatcher.telemetry_mut().record(TelemetryEvent::Dropped { reason: DropReason::Busy });
            }
        }
    }

    /// Drain the queue until shutdown or every producer is gone.
    pub async fn run(&mut self) -> TelemetryEvent {
        info!("Reactor started");
        while let Some(event) = self.receiver.recv().await {
            if !self.step(event).await {
                break;
            }
        }
        let summary = self.dispatcher.telemetry().aggregate_session(self.started.elapsed().as_secs());
        info!("Reactor stopped: {:?}", summary);
        summary
    }
}
