//! Console trait: the human in the loop.
//!
//! Actions that prompt, confirm, or display go through this boundary so the
//! agent can run against a terminal or a scripted fake.

use crate::error::ActionError;
use async_trait::async_trait;

#[async_trait]
pub trait Console: Send + Sync {
    /// Show `prompt` and wait for one line of input (without the newline).
    async fn read_line(&self, prompt: &str) -> std::result::Result<String, ActionError>;

    /// Write text for the user to see.
    async fn display(&self, text: &str) -> std::result::Result<(), ActionError>;

    /// Ask a yes/no question. Only `y` or `yes` (any case) approves.
    async fn confirm(&self, question: &str) -> std::result::Result<bool, ActionError> {
        let answer = self.read_line(&format!("{question} (y/n) ")).await?;
        Ok(matches!(
            answer.trim().to_ascii_lowercase().as_str(),
            "y" | "yes"
        ))
    }
}
