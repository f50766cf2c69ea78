use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::EngineError;
use crate::kernel::intent::{Classification, IntentClassifier};

/// Trained intent classifier behind a JSON endpoint.
pub struct HttpIntentClassifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ParseResponse {
    intent: Option<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    slots: BTreeMap<String, String>,
}

impl HttpIntentClassifier {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(3))
                .build()
                .unwrap_or_default(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(&self, text: &str) -> Result<Option<Classification>> {
        let response = self.client.post(&self.url).json(&ParseRequest { text }).send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Model(format!("NLU server returned {}", response.status())).into());
        }
        let parsed: ParseResponse = response.json().await?;
        Ok(parsed.intent.map(|name| Classification {
            name,
            confidence: parsed.confidence,
            slots: parsed.slots,
        }))
    }
}
