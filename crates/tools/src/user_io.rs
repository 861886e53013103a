//! GetUserInput and OutputInformation: talking to the human directly.

use async_trait::async_trait;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::console::Console;
use sentinel_core::error::ActionError;
use std::sync::Arc;

pub const DEFAULT_INPUT_PROMPT: &str = "Please enter input: ";

pub struct GetUserInputAction {
    console: Arc<dyn Console>,
}

impl GetUserInputAction {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Action for GetUserInputAction {
    fn kind(&self) -> ActionKind {
        ActionKind::GetUserInput
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let prompt = arguments
            .get("prompt")
            .and_then(|v| v.as_str())
            .filter(|p| !p.trim().is_empty());

        let (prompt, notice) = match prompt {
            Some(p) => (format!("{} ", p.trim_end()), None),
            None => (
                DEFAULT_INPUT_PROMPT.to_string(),
                Some("GetUserInput was called without a 'prompt' parameter; a default prompt was shown.".to_string()),
            ),
        };

        let text = self.console.read_line(&prompt).await?;
        Ok(ActionOutcome::Reply { text, notice })
    }
}

pub struct OutputInformationAction {
    console: Arc<dyn Console>,
}

impl OutputInformationAction {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Action for OutputInformationAction {
    fn kind(&self) -> ActionKind {
        ActionKind::OutputInformation
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let info = match arguments.get("info") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => {
                return Err(ActionError::MissingParameter {
                    action: "OutputInformation".into(),
                    parameter: "info".into(),
                });
            }
            Some(other) => other.to_string(),
        };

        self.console.display(&info).await?;
        Ok(ActionOutcome::Acknowledged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::ScriptedConsole;

    fn args(pairs: &[(&str, serde_json::Value)]) -> Arguments {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn user_input_returns_exact_line() {
        let console = Arc::new(ScriptedConsole::new(["cs.AI"]));
        let action = GetUserInputAction::new(console.clone());

        let outcome = action
            .execute(&args(&[("prompt", "Which arXiv topic?".into())]))
            .await
            .unwrap();

        assert_eq!(outcome, ActionOutcome::reply("cs.AI"));
        assert_eq!(console.prompts(), vec!["Which arXiv topic? "]);
    }

    #[tokio::test]
    async fn missing_prompt_uses_default_and_flags_it() {
        let console = Arc::new(ScriptedConsole::new(["hello"]));
        let action = GetUserInputAction::new(console.clone());

        let outcome = action.execute(&Arguments::new()).await.unwrap();
        match outcome {
            ActionOutcome::Reply { text, notice } => {
                assert_eq!(text, "hello");
                assert!(notice.unwrap().contains("prompt"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(console.prompts(), vec![DEFAULT_INPUT_PROMPT]);
    }

    #[tokio::test]
    async fn closed_console_is_an_error() {
        let console = Arc::new(ScriptedConsole::default());
        let action = GetUserInputAction::new(console);
        let err = action
            .execute(&args(&[("prompt", "?".into())]))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Console(_)));
    }

    #[tokio::test]
    async fn output_information_displays_and_acknowledges() {
        let console = Arc::new(ScriptedConsole::default());
        let action = OutputInformationAction::new(console.clone());

        let call = args(&[("info", "I opened the arXiv website".into())]);
        let first = action.execute(&call).await.unwrap();
        let second = action.execute(&call).await.unwrap();

        assert_eq!(first, ActionOutcome::Acknowledged);
        assert_eq!(first, second);
        assert_eq!(
            console.displayed(),
            vec!["I opened the arXiv website", "I opened the arXiv website"]
        );
    }

    #[tokio::test]
    async fn output_information_renders_non_string_values() {
        let console = Arc::new(ScriptedConsole::default());
        let action = OutputInformationAction::new(console.clone());
        action
            .execute(&args(&[("info", serde_json::json!({"step": 3}))]))
            .await
            .unwrap();
        assert_eq!(console.displayed(), vec![r#"{"step":3}"#]);
    }
}
