//! Suggestion service backed by an external command.
//!
//! Spawns the configured command (by default `claude -p`), writes the prompt
//! to its stdin, and parses candidates from its stdout.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use pantry_db::models::InventoryItem;

use super::prompt::{build_suggestion_prompt, parse_candidates};
use super::{RecipeCandidate, RecipeSuggestionService, SuggestError, SuggestionConstraints};

/// Longest stderr excerpt carried in an error.
const STDERR_SNIPPET_BYTES: usize = 1024;

#[derive(Debug, Clone)]
pub struct CommandSuggester {
    command: String,
    args: Vec<String>,
    /// `None` waits indefinitely.
    timeout: Option<Duration>,
}

impl CommandSuggester {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command with `prompt` on stdin and return its stdout.
    async fn run(&self, prompt: &str) -> Result<String, SuggestError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SuggestError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Feed stdin while draining stdout so neither side can block the
        // other, and keep both inside the time limit.
        let stdin = child.stdin.take();
        let exchange = async move {
            let feed = async move {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(prompt.as_bytes()).await?;
                }
                Ok::<(), std::io::Error>(())
            };
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            match fed {
                // The command may exit without reading the whole prompt.
                Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                _ => output,
            }
        };

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| SuggestError::Timeout {
                    secs: limit.as_secs(),
                })??,
            None => exchange.await?,
        };

        if !output.status.success() {
            return Err(SuggestError::CommandFailed {
                exit_code: output.status.code(),
                stderr: truncate_snippet(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for CommandSuggester {
    fn default() -> Self {
        Self::new("claude", vec!["-p".to_string()])
    }
}

#[async_trait]
impl RecipeSuggestionService for CommandSuggester {
    async fn suggest(
        &self,
        owner_id: &str,
        snapshot: &[InventoryItem],
        constraints: &SuggestionConstraints,
        step_label: Option<&str>,
    ) -> Result<Vec<RecipeCandidate>, SuggestError> {
        let prompt = build_suggestion_prompt(snapshot, constraints, step_label);
        debug!(owner = owner_id, command = %self.command, bytes = prompt.len(), "requesting suggestions");

        let stdout = self.run(&prompt).await?;
        let candidates = parse_candidates(&stdout, snapshot)?;

        info!(
            owner = owner_id,
            step = step_label.unwrap_or("-"),
            count = candidates.len(),
            "suggestions received"
        );
        Ok(candidates)
    }
}

fn truncate_snippet(s: &str) -> String {
    let s = s.trim();
    if s.len() <= STDERR_SNIPPET_BYTES {
        return s.to_string();
    }
    let mut end = STDERR_SNIPPET_BYTES;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
