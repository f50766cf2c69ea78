use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::services::shell::ShellExecutor;

/// Deterministic action run when a rule's keywords all appear.
#[async_trait]
pub trait KeywordAction: Send + Sync {
    async fn run(&self, text: &str) -> anyhow::Result<String>;
}

pub struct KeywordRule {
    pub name: String,
    /// Lower-case; every one must be a substring of the input.
    pub keywords: Vec<String>,
    pub action: Box<dyn KeywordAction>,
}

impl KeywordRule {
    pub fn new(name: &str, keywords: &[&str], action: Box<dyn KeywordAction>) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            action,
        }
    }

    pub fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().all(|k| lower.contains(k.as_str()))
    }
}

/// Safety/system commands that must never go through fuzzy matching.
/// First matching rule in list order wins.
#[derive(Default)]
pub struct KeywordRouter {
    rules: Vec<KeywordRule>,
}

impl KeywordRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with the built-in system rules.
    pub fn with_system_rules(shell: Arc<dyn ShellExecutor>) -> Self {
        let mut router = Self::new();
        router.add_rule(KeywordRule::new(
            "restart_service",
            &["reinicia", "servicio"],
            Box::new(RestartService { shell }),
        ));
        router
    }

    pub fn add_rule(&mut self, rule: KeywordRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// `None` on no match. Action failures come back as a sentence.
    pub async fn process(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        let rule = self.rules.iter().find(|r| r.matches(&lower))?;
        info!("Keyword match: rule '{}' fired by '{}'", rule.name, text);

        match rule.action.run(text).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Keyword rule '{}' failed: {:#}", rule.name, e);
                Some(format!("No he podido completar '{}': {}", rule.name, e))
            }
        }
    }
}

const COMMON_SERVICES: &[&str] = &["nginx", "apache2", "mysql", "postgresql", "docker", "bluetooth", "ssh", "cron"];
const FILLER: &[&str] = &["servicio", "de", "el", "la"];

/// `reinicia el servicio X` -> `sudo -n systemctl restart X`.
pub struct RestartService {
    shell: Arc<dyn ShellExecutor>,
}

impl RestartService {
    pub fn new(shell: Arc<dyn ShellExecutor>) -> Self {
        Self { shell }
    }

    pub fn target(text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        if let Some(known) = COMMON_SERVICES.iter().find(|s| lower.contains(*s)) {
            return Some(known.to_string());
        }
        let last = lower.split_whitespace().last()?;
        let last = last.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_' && c != '.');
        (!last.is_empty() && !FILLER.contains(&last)).then(|| last.to_string())
    }
}

#[async_trait]
impl KeywordAction for RestartService {
    async fn run(&self, text: &str) -> anyhow::Result<String> {
        let Some(service) = Self::target(text) else {
            return Ok("No pude identificar el nombre del servicio a reiniciar.".to_string());
        };

        let output = self.shell.run("sudo", &["-n", "systemctl", "restart", &service]).await?;
        if output.success {
            Ok(format!("Éxito: el servicio {} se ha reiniciado correctamente.", service))
        } else {
            let reason = output.stderr.trim();
            let reason = if reason.is_empty() { "permiso denegado o servicio no encontrado." } else { reason };
            Ok(format!("Error al reiniciar {}: {}", service, reason))
        }
    }
}
