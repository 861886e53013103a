//! ReadFile: read a UTF-8 text file for the model.

use async_trait::async_trait;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::error::ActionError;
use std::path::PathBuf;
use tracing::debug;

pub struct ReadFileAction {
    /// Relative paths resolve against this directory (process cwd when unset).
    base_dir: Option<PathBuf>,
}

impl ReadFileAction {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}

impl Default for ReadFileAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Action for ReadFileAction {
    fn kind(&self) -> ActionKind {
        ActionKind::ReadFile
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let file_path = arguments
            .get("file_path")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ActionError::MissingParameter {
                action: "ReadFile".into(),
                parameter: "file_path".into(),
            })?;

        let path = self.resolve(file_path);
        debug!(path = %path.display(), "Reading file");

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ActionError::failed("ReadFile", format!("Failed to read file {file_path}: {e}")))?;

        Ok(ActionOutcome::content(file_path, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_arg(path: &str) -> Arguments {
        let mut args = Arguments::new();
        args.insert("file_path".into(), serde_json::json!(path));
        args
    }

    #[tokio::test]
    async fn read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join(".env.local");
        let mut f = std::fs::File::create(&file_path).unwrap();
        writeln!(f, "PAPER_TOPIC=\"cs.AI\"").unwrap();

        let action = ReadFileAction::new();
        let outcome = action
            .execute(&file_arg(file_path.to_str().unwrap()))
            .await
            .unwrap();

        match outcome {
            ActionOutcome::Content { source, body } => {
                assert!(source.ends_with(".env.local"));
                assert!(body.contains("PAPER_TOPIC"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn relative_paths_use_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hi").unwrap();

        let action = ReadFileAction::with_base_dir(dir.path());
        let outcome = action.execute(&file_arg("notes.txt")).await.unwrap();
        assert_eq!(outcome, ActionOutcome::content("notes.txt", "hi"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let action = ReadFileAction::new();
        let err = action
            .execute(&file_arg("/nonexistent/path/file.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[tokio::test]
    async fn missing_parameter_is_an_error() {
        let action = ReadFileAction::new();
        let err = action.execute(&Arguments::new()).await.unwrap_err();
        assert!(matches!(err, ActionError::MissingParameter { .. }));
    }
}
