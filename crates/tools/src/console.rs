//! Console implementations: the real terminal and a scripted stand-in.

use async_trait::async_trait;
use sentinel_core::console::Console;
use sentinel_core::error::ActionError;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Interactive terminal console.
///
/// All prompts share one buffered stdin reader so that lines typed ahead
/// are not lost between actions.
pub struct TerminalConsole {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn write_stdout(text: &str) -> std::io::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for TerminalConsole {
    async fn read_line(&self, prompt: &str) -> Result<String, ActionError> {
        let mut lines = self.lines.lock().await;
        Self::write_stdout(prompt)
            .await
            .map_err(|e| ActionError::Console(e.to_string()))?;

        match lines.next_line().await {
            Ok(Some(line)) => Ok(line.trim_end_matches('\r').to_string()),
            Ok(None) => Err(ActionError::Console("stdin closed".into())),
            Err(e) => Err(ActionError::Console(e.to_string())),
        }
    }

    async fn display(&self, text: &str) -> Result<(), ActionError> {
        let mut out = text.to_string();
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Self::write_stdout(&out)
            .await
            .map_err(|e| ActionError::Console(e.to_string()))
    }
}

/// A console fed from a queue of lines. Records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    displayed: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: Mutex::new(inputs.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
            displayed: Mutex::new(Vec::new()),
        }
    }

    /// Prompts passed to `read_line`, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Text passed to `display`, in order.
    pub fn displayed(&self) -> Vec<String> {
        lock(&self.displayed).clone()
    }

    pub fn remaining_inputs(&self) -> usize {
        lock(&self.inputs).len()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn read_line(&self, prompt: &str) -> Result<String, ActionError> {
        lock(&self.prompts).push(prompt.to_string());
        lock(&self.inputs)
            .pop_front()
            .ok_or_else(|| ActionError::Console("no scripted input left".into()))
    }

    async fn display(&self, text: &str) -> Result<(), ActionError> {
        lock(&self.displayed).push(text.to_string());
        Ok(())
    }
}
