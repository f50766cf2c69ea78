use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Whitelist;

/// Raw output of the natural-language -> shell model.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub command: String,
    /// Sequence log-likelihood; higher (closer to 0) is better.
    pub score: f32,
}

/// Black-box sequence-to-sequence model.
#[async_trait]
pub trait CommandModel: Send + Sync {
    async fn translate(&self, text: &str) -> anyhow::Result<Option<Translation>>;
}

/// Courtesy phrases that are never commands.
const CHAT_PHRASES: &[&str] = &[
    "hola",
    "gracias",
    "entendido",
    "me he entendido",
    "buenos dias",
    "buenos días",
    "adios",
    "adiós",
    "que tal",
    "qué tal",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    /// Confident and whitelisted: run it now.
    AutoExecute(String),
    /// Anything else the model produced: ask first.
    Confirm(String),
}

pub struct CommandSynthesizer {
    model: Box<dyn CommandModel>,
    whitelist: Whitelist,
    auto_exec_floor: f32,
}

impl CommandSynthesizer {
    pub fn new(model: Box<dyn CommandModel>, whitelist: Whitelist, auto_exec_floor: f32) -> Self {
        Self { model, whitelist, auto_exec_floor }
    }

    /// Map a raw sequence score to a confidence bucket.
    pub fn bucket(score: f32) -> f32 {
        if score > -1.5 {
            0.98
        } else if score > -3.0 {
            0.90
        } else if score > -5.0 {
            0.75
        } else {
            0.50
        }
    }

    pub fn is_chatter(text: &str) -> bool {
        let trimmed = text.trim().to_lowercase();
        CHAT_PHRASES.contains(&trimmed.as_str()) || trimmed.split_whitespace().count() < 2
    }

    /// `(command, confidence)`, or `None` when the model produced nothing.
    /// Chatter is always confidence 0.
    pub async fn infer(&self, text: &str) -> Option<(String, f32)> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if Self::is_chatter(text) {
            info!("Input '{}' filtered as chat/noise", text);
            return None;
        }

        let translation = match self.model.translate(text).await {
            Ok(Some(t)) if !t.command.trim().is_empty() => t,
            Ok(_) => return None,
            Err(e) => {
                warn!("Command model failed: {:#}", e);
                return None;
            }
        };

        let confidence = Self::bucket(translation.score);
        info!(
            "Command model: '{}' -> '{}' (raw {:.2}, conf {:.2})",
            text, translation.command, translation.score, confidence
        );
        Some((translation.command.trim().to_string(), confidence))
    }

    /// Gate an inference result. Below the floor nothing is offered.
    pub fn decide(&self, command: String, confidence: f32) -> Option<Synthesis> {
        if confidence <= self.auto_exec_floor {
            return None;
        }
        if self.whitelist.allows(&command) {
            Some(Synthesis::AutoExecute(command))
        } else {
            Some(Synthesis::Confirm(command))
        }
    }
}
