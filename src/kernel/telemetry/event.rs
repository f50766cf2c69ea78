use serde::{Deserialize, Serialize};

use crate::kernel::state::PendingKind;

// Allowed: kinds, counts, durations
// Forbidden: utterance text, commands, learned values

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// Which stage of the pipeline answered an utterance.
    Resolved { path: ResolutionPath, latency_ms: u64 },

    PendingOpened { kind: PendingKind },
    PendingResolved { kind: PendingKind },
    PendingExpired { kind: PendingKind },

    /// Utterance never reached the dispatcher.
    Dropped { reason: DropReason },

    /// Internal fault turned into a spoken apology.
    Apology,

    /// Proactive trigger fired (timer or alarm).
    Proactive { kind: ProactiveKind },

    SessionSummary {
        duration_secs: u64,
        utterances: u64,
        apologies: u64,
        pending_opened: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionPath {
    Dialogue,
    Keyword,
    Intent,
    Suggestion,
    CommandAuto,
    CommandConfirm,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    NoWakeWord,
    Busy,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProactiveKind {
    Timer,
    Alarm,
}
