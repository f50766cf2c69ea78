//! Timers, reminders and alarms.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, Timelike};

use super::parse::{describe_days, first_number, month_name, parse_alarm, parse_reminder, ReminderParse};
use crate::kernel::actions::{ActionContext, ActionOutcome, Handler};
use crate::kernel::state::PendingState;
use crate::memory::types::{ParsedAlarm, ParsedReminder};
use crate::memory::TimerSlot;

const REMINDER_PREFIXES: &[&str] = &[
    "recuérdame que",
    "recuerdame que",
    "recuérdame el",
    "recuerdame el",
    "añade un recordatorio",
    "recuérdame",
    "recuerdame",
];

/// Strip the leading "recuérdame que" style trigger.
pub fn reminder_body(command: &str) -> &str {
    let trimmed = command.trim();
    let lower = trimmed.to_lowercase();
    for prefix in REMINDER_PREFIXES {
        if lower.starts_with(prefix) && trimmed.is_char_boundary(prefix.len()) {
            return trimmed[prefix.len()..].trim();
        }
    }
    trimmed
}

pub fn confirm_reminder_prompt(reminder: &ParsedReminder) -> String {
    let hour = if reminder.time_inferred {
        "a las 9 de la mañana".to_string()
    } else {
        format!("a las {:02}:{:02}", reminder.time.hour(), reminder.time.minute())
    };
    format!(
        "He entendido: recordatorio para {} el día {} de {} {}. ¿Es correcto?",
        reminder.description,
        reminder.date.day(),
        month_name(reminder.date.month()),
        hour
    )
}

pub fn confirm_alarm_prompt(alarm: &ParsedAlarm) -> String {
    format!(
        "Entendido. Voy a programar una alarma para las {:02}:{:02} {}. ¿Es correcto?",
        alarm.time.hour(),
        alarm.time.minute(),
        describe_days(&alarm.days)
    )
}

/// Outcome of running `text` through the reminder parser.
pub fn plan_reminder(text: &str, now: DateTime<Local>) -> ReminderParse {
    parse_reminder(reminder_body(text), now)
}

/// Start a timer from the first number in `text`. Returns what to say.
pub fn start_timer(timer: &mut TimerSlot, text: &str, now: DateTime<Local>) -> Result<u32, String> {
    match first_number(text) {
        Some(0) => Err("No puedo poner un temporizador de cero minutos.".to_string()),
        Some(minutes) => {
            timer.start(now, minutes);
            Ok(minutes)
        }
        None => Err("No he entendido la duración. Por favor, inténtalo de nuevo.".to_string()),
    }
}

pub struct StartTimerDialogue;

#[async_trait]
impl Handler for StartTimerDialogue {
    fn name(&self) -> &str {
        "iniciar_dialogo_temporizador"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        Ok(ActionOutcome::Ask { prompt: ctx.response.to_string(), pending: PendingState::TimerDuration })
    }
}

pub struct CreateTimer;

#[async_trait]
impl Handler for CreateTimer {
    fn name(&self) -> &str {
        "crear_temporizador_directo"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        Ok(ActionOutcome::Speak(match start_timer(&mut ctx.stores.timer, ctx.command, ctx.now) {
            Ok(minutes) => format!("{} Temporizador de {} minutos iniciado.", ctx.response, minutes)
                .trim()
                .to_string(),
            Err(message) => message,
        }))
    }
}

pub struct QueryTimer;

#[async_trait]
impl Handler for QueryTimer {
    fn name(&self) -> &str {
        "consultar_temporizador"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let text = match ctx.stores.timer.remaining(ctx.now) {
            None => "No hay ningún temporizador activo en este momento.".to_string(),
            Some(left) if left.num_seconds() <= 0 => "El temporizador ya ha terminado.".to_string(),
            Some(left) => {
                let (minutes, seconds) = (left.num_seconds() / 60, left.num_seconds() % 60);
                match (minutes, seconds) {
                    (0, s) => format!("Quedan menos de un minuto, concretamente {} segundos.", s),
                    (m, 0) => format!("Quedan {} minutos.", m),
                    (m, s) => format!("Quedan {} minutos y {} segundos.", m, s),
                }
            }
        };
        Ok(ActionOutcome::Speak(text))
    }
}

pub struct CreateReminder;

#[async_trait]
impl Handler for CreateReminder {
    fn name(&self) -> &str {
        "crear_recordatorio_voz"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        Ok(match plan_reminder(ctx.command, ctx.now) {
            ReminderParse::Complete(reminder) => ActionOutcome::Ask {
                prompt: confirm_reminder_prompt(&reminder),
                pending: PendingState::ReminderConfirm(reminder),
            },
            ReminderParse::NeedsDate { description } => ActionOutcome::Ask {
                prompt: format!("Claro, ¿para cuándo quieres que te recuerde '{}'?", description),
                pending: PendingState::ReminderDate { description },
            },
            ReminderParse::Empty => ActionOutcome::Speak(
                "No he podido entender la descripción del recordatorio. ¿Puedes intentarlo de nuevo?".to_string(),
            ),
        })
    }
}

pub struct TodaysReminders;

#[async_trait]
impl Handler for TodaysReminders {
    fn name(&self) -> &str {
        "consultar_recordatorios_dia"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let today = ctx.stores.reminders.for_day(ctx.now.date_naive());
        if today.is_empty() {
            return Ok(ActionOutcome::Speak("Hoy no tienes ningún recordatorio.".to_string()));
        }
        let list = today
            .iter()
            .map(|r| format!("{} a las {}", r.description, r.at.format("%H:%M")))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(ActionOutcome::Context(format!("Recordatorios de hoy: {}", list)))
    }
}

pub struct CreateAlarm;

#[async_trait]
impl Handler for CreateAlarm {
    fn name(&self) -> &str {
        "crear_alarma_voz"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        Ok(match parse_alarm(ctx.command) {
            Some(alarm) => ActionOutcome::Ask {
                prompt: confirm_alarm_prompt(&alarm),
                pending: PendingState::AlarmConfirm(alarm),
            },
            None => ActionOutcome::Speak(
                "No he podido entender la hora de la alarma. Por favor, inténtalo de nuevo.".to_string(),
            ),
        })
    }
}

pub struct ListAlarms;

#[async_trait]
impl Handler for ListAlarms {
    fn name(&self) -> &str {
        "consultar_alarmas"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let alarms = ctx.stores.alarms.all();
        if alarms.is_empty() {
            return Ok(ActionOutcome::Speak("No tienes ninguna alarma programada.".to_string()));
        }
        let summary = alarms
            .iter()
            .map(|a| format!("{} a las {} {}", a.label, a.time.format("%H:%M"), describe_days(&a.days)))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(ActionOutcome::Speak(format!("{} {}", ctx.response, summary).trim().to_string()))
    }
}
