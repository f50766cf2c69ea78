//! Canned replies and the clock.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Timelike};

use super::parse::{month_name, weekday_name};
use crate::kernel::actions::{ActionContext, ActionOutcome, Handler};

/// Speak the intent's picked response and nothing else.
pub struct SimpleReply;

#[async_trait]
impl Handler for SimpleReply {
    fn name(&self) -> &str {
        "responder_simple"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        if ctx.response.trim().is_empty() {
            return Ok(ActionOutcome::Done);
        }
        Ok(ActionOutcome::Speak(ctx.response.to_string()))
    }
}

pub struct CurrentTime;

#[async_trait]
impl Handler for CurrentTime {
    fn name(&self) -> &str {
        "decir_hora_actual"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let (hour, minute) = (ctx.now.hour(), ctx.now.minute());
        let text = if hour == 1 || hour == 13 {
            format!("Es la una y {:02}.", minute)
        } else {
            format!("Son las {}:{:02}.", hour, minute)
        };
        Ok(ActionOutcome::Speak(text))
    }
}

pub struct CurrentDate;

#[async_trait]
impl Handler for CurrentDate {
    fn name(&self) -> &str {
        "decir_fecha_actual"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let today = ctx.now.date_naive();
        Ok(ActionOutcome::Speak(format!(
            "Hoy es {} {} de {} de {}.",
            weekday_name(today.weekday()),
            today.day(),
            month_name(today.month()),
            today.year()
        )))
    }
}
