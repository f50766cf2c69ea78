use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Where finished sentences go. Fire-and-forget from the caller's side,
/// except that a full queue makes `speak` wait.
#[async_trait]
pub trait SpeechSink: Send + Sync {
    async fn speak(&self, sentence: String) -> Result<()>;
}

/// Hands sentences to the speaker worker over a bounded channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl SpeechSink for ChannelSink {
    async fn speak(&self, sentence: String) -> Result<()> {
        self.tx
            .send(sentence)
            .await
            .map_err(|_| anyhow!("speaker worker is gone"))
    }
}

/// Keeps every sentence in memory.
#[derive(Clone, Default)]
pub struct RecordingSink {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        match self.spoken.lock() {
            Ok(spoken) => spoken.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn take(&self) -> Vec<String> {
        match self.spoken.lock() {
            Ok(mut spoken) => std::mem::take(&mut *spoken),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl SpeechSink for RecordingSink {
    async fn speak(&self, sentence: String) -> Result<()> {
        match self.spoken.lock() {
            Ok(mut spoken) => spoken.push(sentence),
            Err(poisoned) => poisoned.into_inner().push(sentence),
        }
        Ok(())
    }
}
