use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::kernel::intent::types::Candidate;
use crate::memory::types::{ParsedAlarm, ParsedReminder};

/// The one outstanding multi-turn dialogue. At most one variant is live.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PendingState {
    #[default]
    None,
    /// Waiting for the number of minutes of a timer.
    TimerDuration,
    /// Reminder description known, date missing.
    ReminderDate { description: String },
    ReminderConfirm(ParsedReminder),
    AlarmConfirm(ParsedAlarm),
    /// Synthesized shell command awaiting an explicit go-ahead.
    CommandConfirm { command: String },
    /// Waiting for the value of an unknown fact.
    Learning { key: String },
    /// Low-confidence classification awaiting yes/no.
    SuggestionConfirm { original: String, candidate: Candidate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PendingKind {
    TimerDuration,
    ReminderDate,
    ReminderConfirm,
    AlarmConfirm,
    CommandConfirm,
    Learning,
    SuggestionConfirm,
}

impl PendingState {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingState::None)
    }

    pub fn kind(&self) -> Option<PendingKind> {
        Some(match self {
            PendingState::None => return None,
            PendingState::TimerDuration => PendingKind::TimerDuration,
            PendingState::ReminderDate { .. } => PendingKind::ReminderDate,
            PendingState::ReminderConfirm(_) => PendingKind::ReminderConfirm,
            PendingState::AlarmConfirm(_) => PendingKind::AlarmConfirm,
            PendingState::CommandConfirm { .. } => PendingKind::CommandConfirm,
            PendingState::Learning { .. } => PendingKind::Learning,
            PendingState::SuggestionConfirm { .. } => PendingKind::SuggestionConfirm,
        })
    }
}

/// Strict state delta. The only way the pending slot mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    /// Open a dialogue. Rejected while another one is live.
    Enter(PendingState, DateTime<Local>),
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AlreadyPending(PendingKind),
}

#[derive(Debug, Clone, Default)]
pub struct DialogueSlot {
    pending: PendingState,
    entered_at: Option<DateTime<Local>>,
    /// Monotonic, bumped on every accepted delta.
    pub version: u64,
}

impl DialogueSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &PendingState {
        &self.pending
    }

    pub fn entered_at(&self) -> Option<DateTime<Local>> {
        self.entered_at
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Move the live dialogue out, leaving the slot idle. A handler that
    /// chains (`ReminderDate -> ReminderConfirm`) re-enters from idle.
    pub fn take(&mut self) -> PendingState {
        self.version += 1;
        self.entered_at = None;
        std::mem::take(&mut self.pending)
    }

    /// Pure reduction: Slot + Delta -> Mutated Slot
    pub fn reduce(&mut self, delta: StateDelta) -> Result<(), Rejection> {
        match delta {
            StateDelta::Enter(next, at) => {
                if let Some(kind) = self.pending.kind() {
                    warn!("Refusing to open {:?} while {:?} is pending", next.kind(), kind);
                    return Err(Rejection::AlreadyPending(kind));
                }
                info!("Pending dialogue opened: {:?}", next.kind());
                self.entered_at = (!next.is_none()).then_some(at);
                self.pending = next;
            }
            StateDelta::Clear => {
                self.entered_at = None;
                self.pending = PendingState::None;
            }
        }
        self.version += 1;
        Ok(())
    }

    /// True if the live dialogue has outlived `expiry`.
    pub fn is_expired(&self, now: DateTime<Local>, expiry: Option<chrono::Duration>) -> bool {
        match (self.entered_at, expiry) {
            (Some(at), Some(limit)) => now - at >= limit,
            _ => false,
        }
    }
}
