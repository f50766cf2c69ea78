use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::kernel::intent::IntentCatalog;
use crate::kernel::state::PendingState;
use crate::memory::Stores;

/// Everything a handler may look at or write while it runs.
pub struct ActionContext<'a> {
    /// Utterance as resolved (after alias rewrite).
    pub command: &'a str,
    pub parameters: &'a BTreeMap<String, String>,
    /// Response template picked for this execution.
    pub response: &'a str,
    pub now: DateTime<Local>,
    pub stores: &'a mut Stores,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Nothing further to say.
    Done,
    /// Say this verbatim.
    Speak(String),
    /// Result text the chat model may phrase for the user.
    Context(String),
    /// Ask a question and wait for the answer in `pending`.
    Ask { prompt: String, pending: PendingState },
}

/// One registered action.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;
    async fn invoke(&self, ctx: ActionContext<'_>) -> anyhow::Result<ActionOutcome>;
}

/// Action name -> handler, fixed at startup.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        let name = handler.name().to_string();
        if self.handlers.insert(name.clone(), handler).is_some() {
            info!("Handler '{}' replaced", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Every intent must point at a registered action.
    pub fn validate(&self, catalog: &IntentCatalog) -> Result<()> {
        for intent in catalog.intents() {
            if !self.contains(&intent.action) {
                return Err(EngineError::UnknownAction {
                    intent: intent.name.clone(),
                    action: intent.action.clone(),
                });
            }
        }
        Ok(())
    }
}
