use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::matcher::{best_fuzzy, exact_match};
use super::types::{Candidate, IntentCatalog, MatchStrategy};
use crate::config::Thresholds;

/// What a trained classifier reports for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub name: String,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub slots: BTreeMap<String, String>,
}

/// Black-box trained intent classifier.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> anyhow::Result<Option<Classification>>;
}

/// Ordered strategies: exact trigger, fuzzy trigger, trained classifier.
/// The first strategy that accepts wins, whatever later ones would score.
pub struct IntentClassifierCascade {
    catalog: IntentCatalog,
    classifier: Option<Box<dyn IntentClassifier>>,
    thresholds: Thresholds,
}

impl IntentClassifierCascade {
    pub fn new(catalog: IntentCatalog, thresholds: Thresholds) -> Self {
        Self { catalog, classifier: None, thresholds }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub async fn resolve(&self, text: &str) -> Option<Candidate> {
        if text.trim().is_empty() {
            return None;
        }

        if let Some((trigger, intent)) = exact_match(&self.catalog, text) {
            debug!("Exact trigger '{}' -> {}", trigger, intent.name);
            return Some(Candidate::new(intent.clone(), 100, self.thresholds.high_tier, MatchStrategy::Exact));
        }

        if let Some((trigger, intent, score)) = best_fuzzy(&self.catalog, text) {
            if score >= self.thresholds.fuzzy_accept {
                debug!("Fuzzy trigger '{}' -> {} ({})", trigger, intent.name, score);
                return Some(Candidate::new(intent.clone(), score, self.thresholds.high_tier, MatchStrategy::Fuzzy));
            }
            debug!("Best fuzzy '{}' rejected ({} < {})", trigger, score, self.thresholds.fuzzy_accept);
        }

        self.classify(text).await
    }

    async fn classify(&self, text: &str) -> Option<Candidate> {
        let classifier = self.classifier.as_ref()?;
        let result = match classifier.classify(text).await {
            Ok(result) => result?,
            Err(e) => {
                warn!("Intent classifier failed: {:#}", e);
                return None;
            }
        };

        if result.confidence <= self.thresholds.classifier_floor {
            debug!("Classifier '{}' below floor ({:.2})", result.name, result.confidence);
            return None;
        }
        let Some(intent) = self.catalog.get(&result.name) else {
            warn!("Classifier returned unknown intent '{}'", result.name);
            return None;
        };

        let score = (result.confidence.clamp(0.0, 1.0) * 100.0).round() as u8;
        info!("Classifier match: {} ({}%)", intent.name, score);
        let mut candidate = Candidate::new(intent.clone(), score, self.thresholds.high_tier, MatchStrategy::Classifier);
        candidate.parameters.extend(result.slots);
        Some(candidate)
    }
}
