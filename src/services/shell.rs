use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::info;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output on success, "Error: stderr" otherwise.
    pub fn summary(&self) -> String {
        if self.success {
            let out = self.stdout.trim();
            if out.is_empty() { "Comando ejecutado sin salida.".to_string() } else { out.to_string() }
        } else {
            format!("Error: {}", self.stderr.trim())
        }
    }
}

/// Runs processes on behalf of actions.
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Run a program with explicit arguments (no shell parsing).
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Run a full command line through `sh -c`.
    async fn run_line(&self, line: &str) -> Result<CommandOutput> {
        self.run("sh", &["-c", line]).await
    }
}

/// Real process execution with a hard timeout.
#[derive(Debug, Clone)]
pub struct SystemShell {
    timeout: Duration,
}

impl SystemShell {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        info!("Executing: {} {}", program, args.join(" "));
        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| EngineError::Shell(format!("'{}' timed out after {:?}", program, self.timeout)))??;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
