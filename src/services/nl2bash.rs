use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EngineError;
use crate::kernel::synth::{CommandModel, Translation};

/// Natural-language to shell model behind a JSON endpoint.
pub struct HttpCommandModel {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    command: Option<String>,
    /// Sequence log-likelihood, higher is better.
    #[serde(default = "worst_score")]
    score: f32,
}

fn worst_score() -> f32 {
    f32::NEG_INFINITY
}

impl HttpCommandModel {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl CommandModel for HttpCommandModel {
    async fn translate(&self, text: &str) -> Result<Option<Translation>> {
        let response = self.client.post(&self.url).json(&TranslateRequest { text }).send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Model(format!("NL2Bash server returned {}", response.status())).into());
        }
        let parsed: TranslateResponse = response.json().await?;
        Ok(parsed
            .command
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .map(|command| Translation { command, score: parsed.score }))
    }
}
