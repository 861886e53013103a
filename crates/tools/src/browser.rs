//! OpenWebpage: hand a URL to the user's default browser.

use async_trait::async_trait;
use sentinel_core::action::{Action, ActionKind, ActionOutcome, Arguments};
use sentinel_core::console::Console;
use sentinel_core::error::ActionError;
use std::sync::Arc;
use tracing::debug;

/// Launches a URL. Returns once the viewer is spawned, not when it exits.
pub type Launcher = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

pub fn system_launcher() -> Launcher {
    Arc::new(|url: &str| open::that_detached(url))
}

pub struct OpenWebpageAction {
    launcher: Launcher,
    console: Arc<dyn Console>,
}

impl OpenWebpageAction {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self::with_launcher(console, system_launcher())
    }

    pub fn with_launcher(console: Arc<dyn Console>, launcher: Launcher) -> Self {
        Self { launcher, console }
    }
}

/// Add `https://` when the model wrote a bare host like `arxiv.org`.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.contains("://") || url.starts_with("mailto:") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

#[async_trait]
impl Action for OpenWebpageAction {
    fn kind(&self) -> ActionKind {
        ActionKind::OpenWebpage
    }

    async fn execute(&self, arguments: &Arguments) -> Result<ActionOutcome, ActionError> {
        let url = arguments
            .get("url")
            .and_then(|v| v.as_str())
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ActionError::MissingParameter {
                action: "OpenWebpage".into(),
                parameter: "url".into(),
            })?;

        let url = normalize_url(url);
        debug!(url = %url, "Opening webpage");

        (self.launcher)(&url)
            .map_err(|e| ActionError::failed("OpenWebpage", format!("Unable to open {url}: {e}")))?;

        self.console.display(&format!("Opening {url}")).await?;
        Ok(ActionOutcome::Acknowledged)
    }
}
