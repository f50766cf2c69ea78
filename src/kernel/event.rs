use chrono::{DateTime, Local};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub Uuid);

impl UtteranceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UtteranceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the single consumer reacts to. Producers: input reader,
/// speaker worker, proactive loop. Processed strictly in arrival order.
#[derive(Debug, Clone)]
pub enum Event {
    /// User input (transcribed speech or typed text).
    Input(InputEvent),
    /// Speech sink status change.
    Speaker(SpeakerStatus),
    /// Periodic poll for time-based triggers.
    ProactiveTick(DateTime<Local>),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerStatus {
    Speaking,
    Idle,
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub id: UtteranceId,
    pub source: String,
    pub text: String,
}

impl InputEvent {
    pub fn text(source: &str, text: &str) -> Self {
        Self {
            id: UtteranceId::new(),
            source: source.to_string(),
            text: text.to_string(),
        }
    }
}
