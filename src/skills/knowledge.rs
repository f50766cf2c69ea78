//! Learned facts and command aliases.

use anyhow::Result;
use async_trait::async_trait;

use crate::kernel::actions::{ActionContext, ActionOutcome, Handler};
use crate::kernel::state::PendingState;

const FACT_PREFIXES: &[&str] = &["aprende que", "recuerda que", "apunta que"];
const QUESTION_PREFIXES: &[&str] = &["qué sabes de", "que sabes de", "qué es", "que es", "quién es", "quien es", "cuál es", "cual es"];
const ALIAS_PREFIXES: &[&str] = &["cuando diga", "si digo"];
const ALIAS_SEPARATORS: &[&str] = &[" quiero decir ", " significa ", " haz "];

fn strip_any<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| text.strip_prefix(p)).map(str::trim)
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '?' | '¿' | '.' | ',' | '!' | '¡'))
        .to_string()
}

/// `aprende que X es Y` -> (X, Y).
pub fn split_fact(command: &str) -> Option<(String, String)> {
    let lower = normalize(command);
    let body = strip_any(&lower, FACT_PREFIXES)?;
    let (key, value) = body.split_once(" es ")?;
    let key = key.trim_start_matches("mi ").trim_start_matches("el ").trim_start_matches("la ").trim();
    let value = value.trim();
    (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
}

/// `qué es X` -> X.
pub fn fact_subject(command: &str) -> Option<String> {
    let lower = normalize(command);
    let subject = strip_any(&lower, QUESTION_PREFIXES)?;
    let subject = subject.trim_start_matches("mi ").trim_start_matches("el ").trim_start_matches("la ").trim();
    (!subject.is_empty()).then(|| subject.to_string())
}

/// `cuando diga X quiero decir Y` -> (X, Y).
pub fn split_alias(command: &str) -> Option<(String, String)> {
    let lower = normalize(command);
    let body = strip_any(&lower, ALIAS_PREFIXES)?;
    let (trigger, target) = ALIAS_SEPARATORS.iter().find_map(|sep| body.split_once(sep))?;
    let trigger = trigger.trim().trim_matches(',').trim();
    let target = target.trim();
    (!trigger.is_empty() && !target.is_empty()).then(|| (trigger.to_string(), target.to_string()))
}

pub struct LearnFact;

#[async_trait]
impl Handler for LearnFact {
    fn name(&self) -> &str {
        "aprender_dato"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let Some((key, value)) = split_fact(ctx.command) else {
            return Ok(ActionOutcome::Speak("No he entendido qué debo aprender.".to_string()));
        };
        ctx.stores.facts.add(&key, &value)?;
        Ok(ActionOutcome::Speak(format!("Entendido. He aprendido que {} es {}.", key, value)))
    }
}

pub struct RecallFact;

#[async_trait]
impl Handler for RecallFact {
    fn name(&self) -> &str {
        "consultar_dato"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let Some(key) = fact_subject(ctx.command) else {
            return Ok(ActionOutcome::Speak("¿Sobre qué quieres que te diga lo que sé?".to_string()));
        };
        Ok(match ctx.stores.facts.get(&key) {
            Some(value) => ActionOutcome::Speak(format!("{} es {}.", key, value)),
            None => ActionOutcome::Ask {
                prompt: format!("No sé qué es {}. ¿Me lo enseñas?", key),
                pending: PendingState::Learning { key },
            },
        })
    }
}

pub struct LearnAlias;

#[async_trait]
impl Handler for LearnAlias {
    fn name(&self) -> &str {
        "aprender_alias"
    }

    async fn invoke(&self, ctx: ActionContext<'_>) -> Result<ActionOutcome> {
        let Some((trigger, target)) = split_alias(ctx.command) else {
            return Ok(ActionOutcome::Speak(
                "Dime el atajo así: cuando diga X quiero decir Y.".to_string(),
            ));
        };
        ctx.stores.aliases.learn(&trigger, &target)?;
        Ok(ActionOutcome::Speak(format!("Entendido. Aprendo que '{}' es '{}'.", trigger, target)))
    }
}
