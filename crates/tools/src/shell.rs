//! ExecuteCLICommand: run a shell command with the user in the loop.
//!
//! Output is streamed to the console as it arrives. When the output looks
//! like the command is waiting for input (`(y/n)`, `password:` and so on),
//! one line is read from the user and written to the child's stdin.

use async_trait::async_trait;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::console::Console;
use sentinel_core::error::ActionError;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

pub struct RunCommandAction {
    console: Arc<dyn Console>,
    /// Lowercased substrings that mean "awaiting input".
    input_markers: Vec<String>,
}

impl RunCommandAction {
    pub fn new(console: Arc<dyn Console>, input_markers: Vec<String>) -> Self {
        Self {
            console,
            input_markers: input_markers
                .into_iter()
                .map(|m| m.to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    fn awaits_input(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.input_markers.iter().any(|m| text.contains(m.as_str()))
    }

    fn shell(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Text after the last newline, i.e. the line still being written.
fn open_line(text: &str) -> &str {
    match text.rfind('\n') {
        Some(i) => &text[i + 1..],
        None => text,
    }
}

#[async_trait]
impl Action for RunCommandAction {
    fn kind(&self) -> ActionKind {
        ActionKind::ExecuteCliCommand
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let command = arguments
            .get("command")
            .and_then(|v| v.as_str())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ActionError::MissingParameter {
                action: "ExecuteCLICommand".into(),
                parameter: "command".into(),
            })?;

        debug!(command = %command, "Executing shell command");

        let mut child = Self::shell(command)
            .spawn()
            .map_err(|e| ActionError::failed("ExecuteCLICommand", e))?;

        let mut stdin = child.stdin.take();
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ActionError::failed("ExecuteCLICommand", "stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ActionError::failed("ExecuteCLICommand", "stderr not captured"))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        let mut collected = String::new();
        let mut carry = String::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = stdout
                .read(&mut chunk)
                .await
                .map_err(|e| ActionError::failed("ExecuteCLICommand", e))?;
            if n == 0 {
                break;
            }

            let text = String::from_utf8_lossy(&chunk[..n]).into_owned();
            collected.push_str(&text);
            self.console.display(text.trim_end_matches('\n')).await?;

            let window = format!("{carry}{text}");
            let pending = open_line(&window);
            if self.awaits_input(pending) {
                carry.clear();
                let answer = self.console.read_line("").await?;
                if let Some(pipe) = stdin.as_mut() {
                    let line = format!("{answer}\n");
                    if let Err(e) = pipe.write_all(line.as_bytes()).await {
                        warn!(error = %e, "Command closed stdin before input was forwarded");
                        stdin = None;
                    } else if let Err(e) = pipe.flush().await {
                        warn!(error = %e, "Failed to flush command stdin");
                    }
                }
            } else {
                carry = pending.to_string();
            }
        }

        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| ActionError::failed("ExecuteCLICommand", e))?;
        let errors = stderr_task.await.unwrap_or_default();

        if status.success() {
            return Ok(ActionOutcome::content(format!("$ {command}"), collected));
        }

        let code = status.code().unwrap_or(-1);
        warn!(command = %command, exit_code = code, "Command failed");
        let body = if errors.trim().is_empty() { collected } else { errors };
        Ok(ActionOutcome::content(
            format!("$ {command} (exit code {code})"),
            body,
        ))
    }
}
