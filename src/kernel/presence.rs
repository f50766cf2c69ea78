use chrono::{DateTime, Duration, Local};

use super::event::SpeakerStatus;

/// Whether the engine is currently willing to take an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceState {
    /// Only utterances carrying the wake word are processed.
    #[default]
    Attentive,
    /// Active listening window: follow-ups need no wake word.
    Listening { until: DateTime<Local> },
    /// Speaker is talking. Input is dropped.
    Busy,
}

/// Signals that request a presence transition.
#[derive(Debug, Clone, Copy)]
pub enum PresenceRequest {
    Accepted,
    Speaker(SpeakerStatus),
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Wake word stripped, lower-cased, trimmed.
    Accepted(String),
    NoWakeWord,
    Busy,
}

/// Wake-word gate plus the post-speech listening window.
#[derive(Debug, Clone)]
pub struct Presence {
    state: PresenceState,
    wake_word: String,
    window: Duration,
}

impl Presence {
    pub fn new(wake_word: &str, window: std::time::Duration) -> Self {
        Self {
            state: PresenceState::Attentive,
            wake_word: wake_word.to_lowercase(),
            window: Duration::from_std(window).unwrap_or_else(|_| Duration::seconds(8)),
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == PresenceState::Busy
    }

    /// Pure function: (Current State, Request, now) -> New State
    pub fn transition(current: PresenceState, request: PresenceRequest, now: DateTime<Local>, window: Duration) -> PresenceState {
        use PresenceState::*;

        match (current, request) {
            (_, PresenceRequest::Speaker(SpeakerStatus::Speaking)) => Busy,
            (_, PresenceRequest::Speaker(SpeakerStatus::Idle)) => Listening { until: now + window },
            (Busy, PresenceRequest::Accepted) => Busy,
            (_, PresenceRequest::Accepted) => Listening { until: now + window },
            (Listening { until }, PresenceRequest::Poll) if now >= until => Attentive,
            (state, PresenceRequest::Poll) => state,
        }
    }

    pub fn apply(&mut self, request: PresenceRequest, now: DateTime<Local>) {
        self.state = Self::transition(self.state, request, now, self.window);
    }

    /// Decide whether `text` is for us and strip the wake word if so.
    pub fn admit(&mut self, text: &str, now: DateTime<Local>) -> Admission {
        self.apply(PresenceRequest::Poll, now);
        if self.is_busy() {
            return Admission::Busy;
        }

        let lower = text.to_lowercase();
        let listening = matches!(self.state, PresenceState::Listening { .. });
        let has_wake_word = !self.wake_word.is_empty() && lower.contains(&self.wake_word);
        if !listening && !has_wake_word {
            return Admission::NoWakeWord;
        }

        let cleaned = if has_wake_word {
            lower.replace(&self.wake_word, "")
        } else {
            lower
        };
        let cleaned = cleaned
            .trim_matches(|c: char| c.is_whitespace() || c == ',')
            .to_string();

        self.apply(PresenceRequest::Accepted, now);
        Admission::Accepted(cleaned)
    }
}
