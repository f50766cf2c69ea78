//! Multi-turn dialogues. While one is pending every utterance goes here.

use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::kernel::intent::types::Candidate;
use crate::kernel::state::{DialogueSlot, PendingKind, PendingState, Rejection, StateDelta};
use crate::memory::types::Reminder;
use crate::memory::Stores;
use crate::services::shell::ShellExecutor;
use crate::skills::organizer::{confirm_reminder_prompt, plan_reminder, start_timer};
use crate::skills::parse::ReminderParse;

/// Substring affirmatives for the reminder/alarm/command confirmations.
const CONFIRM_TOKENS: &[&str] = &["sí", "si", "correcto"];
/// Whole-utterance replies to "¿Te refieres a ...?".
const SUGGESTION_YES: &[&str] = &["sí", "si", "claro", "yes", "correcto", "eso es"];
const SUGGESTION_NO: &[&str] = &["no", "negativo", "cancelar"];
const LEARNING_ABORT: &[&str] = &["cancelar", "no lo sé", "no lo se"];

#[derive(Debug, Clone, PartialEq)]
pub enum DialogueOutcome {
    /// Nothing pending; resolve normally.
    NotApplicable,
    /// Consumed. Say `reply` if any.
    Handled(Option<String>),
    /// Suggestion accepted: run this candidate for `original`.
    Execute { candidate: Candidate, original: String, reply: String },
    /// Suggestion ignored: pending cleared, resolve the utterance fresh.
    Reroute,
}

/// Case-insensitive substring rule. "no, sí" counts as yes.
pub fn contains_affirmative(text: &str) -> bool {
    let lower = text.to_lowercase();
    CONFIRM_TOKENS.iter().any(|t| lower.contains(t))
}

fn bare(text: &str) -> String {
    text.to_lowercase()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

pub fn is_suggestion_yes(text: &str) -> bool {
    SUGGESTION_YES.contains(&bare(text).as_str())
}

pub fn is_suggestion_no(text: &str) -> bool {
    SUGGESTION_NO.contains(&bare(text).as_str())
}

/// Owns the single pending slot.
#[derive(Debug, Clone, Default)]
pub struct DialogueStateMachine {
    slot: DialogueSlot,
    expiry: Option<chrono::Duration>,
}

impl DialogueStateMachine {
    pub fn new(expiry: Option<chrono::Duration>) -> Self {
        Self { slot: DialogueSlot::new(), expiry }
    }

    pub fn pending(&self) -> &PendingState {
        self.slot.pending()
    }

    pub fn pending_kind(&self) -> Option<PendingKind> {
        self.slot.pending().kind()
    }

    pub fn is_idle(&self) -> bool {
        self.slot.is_idle()
    }

    /// Open a dialogue. Fails if one is already live.
    pub fn enter(&mut self, pending: PendingState, now: DateTime<Local>) -> Result<(), Rejection> {
        self.slot.reduce(StateDelta::Enter(pending, now))
    }

    pub fn clear(&mut self) {
        let _ = self.slot.reduce(StateDelta::Clear);
    }

    /// Drop a dialogue that has outlived the expiry. Returns what was dropped.
    pub fn expire(&mut self, now: DateTime<Local>) -> Option<PendingKind> {
        if !self.slot.is_expired(now, self.expiry) {
            return None;
        }
        let kind = self.pending_kind();
        info!("Pending dialogue {:?} expired", kind);
        self.clear();
        kind
    }

    pub async fn handle(
        &mut self,
        text: &str,
        now: DateTime<Local>,
        stores: &mut Stores,
        shell: &dyn ShellExecutor,
    ) -> anyhow::Result<DialogueOutcome> {
        if self.slot.is_idle() {
            return Ok(DialogueOutcome::NotApplicable);
        }
        if self.expire(now).is_some() {
            return Ok(DialogueOutcome::NotApplicable);
        }

        let pending = self.slot.take();
        info!("Resolving pending {:?}", pending.kind());

        let reply = match pending {
            PendingState::None => return Ok(DialogueOutcome::NotApplicable),

            PendingState::TimerDuration => match start_timer(&mut stores.timer, text, now) {
                Ok(minutes) => format!("Entendido, temporizador de {} minutos iniciado.", minutes),
                Err(message) => message,
            },

            PendingState::ReminderDate { description } => {
                let combined = format!("{} {}", description, text);
                match plan_reminder(&combined, now) {
                    ReminderParse::Complete(reminder) => {
                        let prompt = confirm_reminder_prompt(&reminder);
                        self.chain(PendingState::ReminderConfirm(reminder), now);
                        prompt
                    }
                    _ => "Sigo sin entender la fecha. Vuelve a pedirme el recordatorio, por favor.".to_string(),
                }
            }

            PendingState::ReminderConfirm(parsed) => {
                if contains_affirmative(text) {
                    stores.reminders.add(Reminder { description: parsed.description.clone(), at: parsed.at() })?;
                    "¡Perfecto! Recordatorio guardado.".to_string()
                } else {
                    "De acuerdo, he cancelado el recordatorio.".to_string()
                }
            }

            PendingState::AlarmConfirm(parsed) => {
                if contains_affirmative(text) {
                    stores.alarms.add(parsed.into())?;
                    "¡Hecho! Alarma guardada.".to_string()
                } else {
                    "De acuerdo, he cancelado la alarma.".to_string()
                }
            }

            PendingState::CommandConfirm { command } => {
                if contains_affirmative(text) {
                    match shell.run_line(&command).await {
                        Ok(output) => output.summary(),
                        Err(e) => {
                            warn!("Confirmed command failed: {:#}", e);
                            format!("Error: {}", e)
                        }
                    }
                } else {
                    "Vale, no lo ejecuto.".to_string()
                }
            }

            PendingState::Learning { key } => {
                let lower = text.to_lowercase();
                if LEARNING_ABORT.iter().any(|t| lower.contains(t)) {
                    "Vale, no pasa nada.".to_string()
                } else {
                    let value = text.trim();
                    stores.facts.add(&key, value)?;
                    format!("Entendido. He aprendido que {} es {}.", key, value)
                }
            }

            PendingState::SuggestionConfirm { original, candidate } => {
                if is_suggestion_yes(text) {
                    let canonical = candidate.intent.canonical_trigger().to_string();
                    stores.aliases.learn(&original, &canonical)?;
                    let reply = format!("Entendido. Aprendo que '{}' es '{}'.", original, canonical);
                    return Ok(DialogueOutcome::Execute { candidate, original, reply });
                }
                if is_suggestion_no(text) {
                    "Vale, perdona. ¿Qué querías decir?".to_string()
                } else {
                    return Ok(DialogueOutcome::Reroute);
                }
            }
        };

        Ok(DialogueOutcome::Handled(Some(reply)))
    }

    fn chain(&mut self, next: PendingState, now: DateTime<Local>) {
        if let Err(rejection) = self.enter(next, now) {
            warn!("Chained dialogue refused: {:?}", rejection);
        }
    }
}
