use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Fixed confidence gates. Scores are on the 0-100 cascade scale unless noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum token-set ratio a fuzzy trigger match must reach.
    pub fuzzy_accept: u8,
    /// Score at or above which a candidate is `high` tier.
    pub high_tier: u8,
    /// Trained classifier confidence floor (0.0 - 1.0, exclusive).
    pub classifier_floor: f32,
    /// Command synthesizer auto-exec floor (0.0 - 1.0, exclusive).
    pub synth_auto_exec: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fuzzy_accept: 85,
            high_tier: 85,
            classifier_floor: 0.5,
            synth_auto_exec: 0.6,
        }
    }
}

/// Commands the synthesizer may run without confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Whitelist {
    /// A command is allowed if it starts with any of these.
    pub prefixes: Vec<String>,
    /// A command is allowed if it equals any of these.
    pub exact: Vec<String>,
}

impl Default for Whitelist {
    fn default() -> Self {
        Self {
            prefixes: vec!["echo ".to_string(), "ls ".to_string()],
            exact: vec!["ls".to_string()],
        }
    }
}

/// Shell syntax that could chain or redirect past a whitelisted prefix.
const SHELL_METACHARACTERS: &[&str] = &[";", "&", "|", "`", "$(", ">", "<", "\n"];

impl Whitelist {
    /// Commands containing shell metacharacters are never allowed.
    pub fn allows(&self, command: &str) -> bool {
        if SHELL_METACHARACTERS.iter().any(|m| command.contains(m)) {
            return false;
        }
        self.exact.iter().any(|e| e == command) || self.prefixes.iter().any(|p| command.starts_with(p.as_str()))
    }
}

/// Engine configuration, loaded from TOML. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub wake_word: String,
    pub listening_window_secs: u64,
    pub thresholds: Thresholds,
    pub synth_whitelist: Whitelist,
    /// `None` keeps pending dialogues until the next utterance.
    pub pending_expiry_secs: Option<u64>,
    /// Let the chat model re-phrase textual action results.
    pub rephrase_results: bool,
    pub proactive_interval_ms: u64,
    pub llm_url: String,
    pub nlu_url: Option<String>,
    pub nl2bash_url: Option<String>,
    /// Program invoked with one sentence as its last argument. Printed if absent.
    pub tts_command: Option<String>,
    pub data_dir: PathBuf,
    pub intents_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wake_word: "neo".to_string(),
            listening_window_secs: 8,
            thresholds: Thresholds::default(),
            synth_whitelist: Whitelist::default(),
            pending_expiry_secs: Some(300),
            rephrase_results: true,
            proactive_interval_ms: 1000,
            llm_url: "http://localhost:8080".to_string(),
            nlu_url: None,
            nl2bash_url: None,
            tts_command: None,
            data_dir: PathBuf::from("data"),
            intents_path: PathBuf::from("config/intents.json"),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Resolve the config path from the first CLI argument or `$VOXCORE_CONFIG`.
    pub fn locate() -> Option<PathBuf> {
        std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("VOXCORE_CONFIG").map(PathBuf::from))
    }

    pub fn listening_window(&self) -> Duration {
        Duration::from_secs(self.listening_window_secs)
    }

    pub fn pending_expiry(&self) -> Option<chrono::Duration> {
        self.pending_expiry_secs
            .and_then(|s| chrono::Duration::try_seconds(s as i64))
    }
}
