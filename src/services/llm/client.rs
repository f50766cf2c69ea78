use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Text generator that streams fragments as they are produced.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Push fragments of the completion of `prompt` into `tx` until
    /// generation ends. A closed receiver ends generation early.
    async fn stream(&self, prompt: &str, tx: mpsc::Sender<String>) -> Result<()>;
}

#[derive(Clone)]
pub struct LlmService {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    stream: bool,
    n_predict: usize,
    temperature: f32,
    stop: Vec<&'a str>,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    content: String,
    #[serde(default)]
    stop: bool,
}

impl LlmService {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(2))
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// `data: {...}` line of the llama-server event stream.
fn parse_sse_line(line: &str) -> Option<CompletionChunk> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    match serde_json::from_str(payload) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            debug!("Skipping malformed stream line: {}", e);
            None
        }
    }
}

enum Flow {
    Continue,
    Stop,
}

/// Decode one complete SSE line and pass its content on.
async fn forward_line(line: &[u8], tx: &mpsc::Sender<String>) -> Flow {
    let line = String::from_utf8_lossy(line);
    let Some(chunk) = parse_sse_line(line.trim()) else {
        return Flow::Continue;
    };
    if !chunk.content.is_empty() && tx.send(chunk.content).await.is_err() {
        warn!("Reply consumer went away, stopping generation");
        return Flow::Stop;
    }
    if chunk.stop {
        Flow::Stop
    } else {
        Flow::Continue
    }
}

#[async_trait]
impl ChatModel for LlmService {
    async fn stream(&self, prompt: &str, tx: mpsc::Sender<String>) -> Result<()> {
        let request_body = CompletionRequest {
            prompt,
            stream: true,
            n_predict: 256,
            temperature: 0.7,
            stop: vec!["<|user|>", "<|end_of_text|>"],
        };

        let response = self
            .client
            .post(format!("{}/completion", self.base_url))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::Model(format!("LLM server returned {}", response.status())).into());
        }

        let mut bytes = response.bytes_stream();
        // Raw bytes: a character may straddle two network chunks.
        let mut pending: Vec<u8> = Vec::new();

        while let Some(chunk) = bytes.next().await {
            pending.extend_from_slice(&chunk?);

            while let Some(newline) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                match forward_line(&line, &tx).await {
                    Flow::Continue => {}
                    Flow::Stop => return Ok(()),
                }
            }
        }
        if !pending.is_empty() {
            forward_line(&pending, &tx).await;
        }
        Ok(())
    }
}
