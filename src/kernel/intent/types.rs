use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{EngineError, Result};

/// A named thing the user can ask for, as declared in the intent catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    pub triggers: Vec<String>,
    pub responses: Vec<String>,
    pub action: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Intent {
    /// Human-readable phrase used when asking "did you mean ...?".
    pub fn canonical_trigger(&self) -> &str {
        self.triggers.first().map(String::as_str).unwrap_or(self.name.as_str())
    }

    /// One response template, uniformly at random.
    pub fn pick_response(&self) -> String {
        self.responses
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStrategy {
    Exact,
    Fuzzy,
    Classifier,
}

/// One resolution attempt's winner. Lives for a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub intent: Intent,
    /// Normalized 0-100.
    pub score: u8,
    pub tier: ConfidenceTier,
    pub strategy: MatchStrategy,
    /// Slots extracted by the classifier merged over the intent defaults.
    pub parameters: BTreeMap<String, String>,
}

impl Candidate {
    pub fn new(intent: Intent, score: u8, high_tier: u8, strategy: MatchStrategy) -> Self {
        let score = score.min(100);
        let tier = if score >= high_tier { ConfidenceTier::High } else { ConfidenceTier::Low };
        let parameters = intent.parameters.clone();
        Self { intent, score, tier, strategy, parameters }
    }
}

/// The immutable set of intents loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct IntentCatalog {
    intents: Vec<Intent>,
}

impl IntentCatalog {
    /// Validates and normalizes (triggers lower-cased, trimmed).
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(intents.len());
        for mut intent in intents {
            if !seen.insert(intent.name.clone()) {
                return Err(EngineError::InvalidIntent(intent.name, "duplicate name".to_string()));
            }
            intent.triggers = intent
                .triggers
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
            if intent.triggers.is_empty() {
                return Err(EngineError::InvalidIntent(intent.name, "no triggers".to_string()));
            }
            if intent.responses.is_empty() {
                return Err(EngineError::InvalidIntent(intent.name, "no responses".to_string()));
            }
            normalized.push(intent);
        }
        Ok(Self { intents: normalized })
    }

    /// Load a JSON array of intents.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let intents: Vec<Intent> = serde_json::from_str(&content)?;
        Self::new(intents)
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn get(&self, name: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.name == name)
    }

    /// Every `(trigger, intent)` pair.
    pub fn triggers(&self) -> impl Iterator<Item = (&str, &Intent)> {
        self.intents
            .iter()
            .flat_map(|i| i.triggers.iter().map(move |t| (t.as_str(), i)))
    }
}
