//! GetLib: the static help library for deploying arXiv Sentinel.

use async_trait::async_trait;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::error::ActionError;
use std::path::Path;
use tracing::warn;

/// Built-in knowledge base: the websites and Vercel commands the user needs.
pub const DEFAULT_KNOWLEDGE: &str = r#"Websites:
    Vercel's homepage. Vercel is a serverless function host platform, the arXiv sentinel should be deployed to this platform:
    https://vercel.com/

    Google APP password page. arXiv sentinel needs to send emails to users, so it needs an APP password from this website:
    https://myaccount.google.com/apppasswords

    OpenAI API key page. arXiv sentinel needs an LLM to summarize papers, so you need to get the key from this website:
    https://platform.openai.com/settings/profile

    arXiv homepage:
    https://arxiv.org/

CLI Tools:
    Local test vercel project:
    vercel dev

    Deploy vercel project:
    vercel deploy --prod

    Add env variables in vercel:
    echo [value] | vercel env add [name] [environment]
    environment can be: production | development

    Remove env variables in vercel:
    vercel env rm [name]

    Get existing env variables (you will get a file '.env.local'):
    vercel env pull
"#;

/// Load the knowledge base from `path`, falling back to the built-in text.
pub fn load_knowledge(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_KNOWLEDGE.to_string();
    };

    match std::fs::read_to_string(path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!(path = %path.display(), "Knowledge file is empty, using built-in text");
            DEFAULT_KNOWLEDGE.to_string()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read knowledge file, using built-in text");
            DEFAULT_KNOWLEDGE.to_string()
        }
    }
}

pub struct GetLibAction {
    text: String,
}

impl GetLibAction {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for GetLibAction {
    fn default() -> Self {
        Self::new(DEFAULT_KNOWLEDGE)
    }
}

#[async_trait]
impl Action for GetLibAction {
    fn kind(&self) -> ActionKind {
        ActionKind::GetLib
    }

    async fn execute(&self, _arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        Ok(ActionOutcome::Knowledge(self.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_knowledge_ignoring_arguments() {
        let action = GetLibAction::default();
        let mut args = Arguments::new();
        args.insert("unexpected".into(), serde_json::json!(1));
        let outcome = action.execute(&args).await.unwrap();
        match outcome {
            ActionOutcome::Knowledge(text) => {
                assert!(text.contains("https://vercel.com/"));
                assert!(text.contains("vercel env pull"));
                assert!(text.contains("myaccount.google.com/apppasswords"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn load_prefers_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.md");
        std::fs::write(&path, "custom notes").unwrap();
        assert_eq!(load_knowledge(Some(&path)), "custom notes");
    }

    #[test]
    fn load_falls_back_on_missing_or_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.md");
        assert_eq!(load_knowledge(Some(&missing)), DEFAULT_KNOWLEDGE);

        let empty = dir.path().join("empty.md");
        std::fs::write(&empty, "  \n").unwrap();
        assert_eq!(load_knowledge(Some(&empty)), DEFAULT_KNOWLEDGE);

        assert_eq!(load_knowledge(None), DEFAULT_KNOWLEDGE);
    }
}
