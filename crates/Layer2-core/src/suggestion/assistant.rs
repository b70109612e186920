//! Assistant process runner

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::SuggestionError;

/// One-shot prompt execution against the assistant
#[async_trait]
pub trait AssistantRunner: Send + Sync {
    /// Run `prompt` and return the raw response text
    async fn run(&self, prompt: &str) -> Result<String, SuggestionError>;
}

/// The `claude` CLI in print mode (`claude -p <prompt>`)
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    program: String,
}

impl ClaudeCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Map a failed run's stderr to an error kind
pub(crate) fn classify_failure(stderr: &str, code: Option<i32>) -> SuggestionError {
    let lower = stderr.to_lowercase();
    let auth_hints = [
        "not logged in",
        "please log in",
        "login",
        "authenticat",
        "api key",
        "unauthorized",
        "401",
    ];
    if auth_hints.iter().any(|hint| lower.contains(hint)) {
        return SuggestionError::NotAuthenticated;
    }

    let detail = stderr.trim();
    if detail.is_empty() {
        SuggestionError::Other(format!(
            "assistant exited with code {}",
            code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".into())
        ))
    } else {
        SuggestionError::Other(detail.lines().next().unwrap_or(detail).to_string())
    }
}

#[async_trait]
impl AssistantRunner for ClaudeCli {
    async fn run(&self, prompt: &str) -> Result<String, SuggestionError> {
        let program = which::which(&self.program)
            .map_err(|_| SuggestionError::NotInstalled(self.program.clone()))?;

        debug!("Running {} -p ({} chars)", program.display(), prompt.len());
        // Dropping the future on timeout kills the child
        let output = Command::new(program)
            .arg("-p")
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => SuggestionError::NotInstalled(self.program.clone()),
                _ => SuggestionError::Other(format!("Failed to spawn process: {}", e)),
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout)
            } else {
                stderr
            };
            Err(classify_failure(&stderr, output.status.code()))
        }
    }
}
