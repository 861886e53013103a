//! Action vocabulary: the closed set of capabilities the model may invoke.
//!
//! The model names actions in `Action: Name(k=v, ...)` lines. Each name maps
//! to one [`ActionKind`], and each kind to exactly one [`Action`] handler in
//! the [`ActionRegistry`]. Nothing outside this vocabulary ever runs.

use crate::error::ActionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Named argument values of one call. Ordered for stable display.
pub type Arguments = BTreeMap<String, serde_json::Value>;

/// One parsed invocation request from a model reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    /// Action name as written by the model (not yet resolved)
    pub name: String,

    /// Named arguments; empty for `Name()`
    #[serde(default)]
    pub arguments: Arguments,
}

impl ActionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// The result of executing one action. Exactly one feedback message is
/// derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Success with nothing to report back
    Acknowledged,

    /// Text the user typed; `notice` flags a degraded call (e.g. missing prompt)
    Reply {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },

    /// Retrieved content (file, API body, command output, search results)
    Content { source: String, body: String },

    /// Reference material that belongs in the system role
    Knowledge(String),

    /// The user refused the confirmation prompt
    Declined(String),

    /// Error description for the model
    Failed(String),
}

impl ActionOutcome {
    pub fn content(source: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Content {
            source: source.into(),
            body: body.into(),
        }
    }

    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply {
            text: text.into(),
            notice: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What an action touches when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// Reads from the network or filesystem
    ReadExternal,
    /// Changes state outside the process (browser, shell)
    WriteExternal,
    /// Blocks on the human
    PromptUser,
    /// Pure output or static data
    Informational,
}

/// A declared parameter of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub required: bool,
}

const fn required(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        required: true,
    }
}

const fn optional(name: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        required: false,
    }
}

/// The closed action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    GetLib,
    OpenWebpage,
    CallApi,
    ExecuteCliCommand,
    GetUserInput,
    OutputInformation,
    ReadFile,
    Search,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::GetLib,
        ActionKind::OpenWebpage,
        ActionKind::CallApi,
        ActionKind::ExecuteCliCommand,
        ActionKind::GetUserInput,
        ActionKind::OutputInformation,
        ActionKind::ReadFile,
        ActionKind::Search,
    ];

    /// The canonical directive name the model writes.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::GetLib => "GetLib",
            ActionKind::OpenWebpage => "OpenWebpage",
            ActionKind::CallApi => "CallAPI",
            ActionKind::ExecuteCliCommand => "ExecuteCLICommand",
            ActionKind::GetUserInput => "GetUserInput",
            ActionKind::OutputInformation => "OutputInformation",
            ActionKind::ReadFile => "ReadFile",
            ActionKind::Search => "Search",
        }
    }

    /// Alternative spellings accepted verbatim.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            ActionKind::GetLib => &["get-knowledge-base", "GetKnowledgeBase"],
            ActionKind::OpenWebpage => &["open-webpage"],
            ActionKind::CallApi => &["call-api"],
            ActionKind::ExecuteCliCommand => &["run-command", "RunCommand"],
            ActionKind::GetUserInput => &["get-user-input"],
            ActionKind::OutputInformation => &["output-information"],
            ActionKind::ReadFile => &["read-file"],
            ActionKind::Search => &["search", "GoogleSearch"],
        }
    }

    pub fn params(self) -> &'static [ParamSpec] {
        const NONE: &[ParamSpec] = &[];
        const URL: &[ParamSpec] = &[required("url")];
        const CALL_API: &[ParamSpec] = &[required("url"), optional("params"), optional("headers")];
        const COMMAND: &[ParamSpec] = &[required("command")];
        const PROMPT: &[ParamSpec] = &[optional("prompt")];
        const INFO: &[ParamSpec] = &[required("info")];
        const FILE: &[ParamSpec] = &[required("file_path")];
        const SEARCH: &[ParamSpec] = &[required("query"), optional("cse_id"), optional("api_key")];

        match self {
            ActionKind::GetLib => NONE,
            ActionKind::OpenWebpage => URL,
            ActionKind::CallApi => CALL_API,
            ActionKind::ExecuteCliCommand => COMMAND,
            ActionKind::GetUserInput => PROMPT,
            ActionKind::OutputInformation => INFO,
            ActionKind::ReadFile => FILE,
            ActionKind::Search => SEARCH,
        }
    }

    pub fn required_params(self) -> impl Iterator<Item = &'static str> {
        self.params().iter().filter(|p| p.required).map(|p| p.name)
    }

    pub fn side_effect(self) -> SideEffect {
        match self {
            ActionKind::GetLib | ActionKind::OutputInformation => SideEffect::Informational,
            ActionKind::OpenWebpage | ActionKind::ExecuteCliCommand => SideEffect::WriteExternal,
            ActionKind::CallApi | ActionKind::ReadFile | ActionKind::Search => {
                SideEffect::ReadExternal
            }
            ActionKind::GetUserInput => SideEffect::PromptUser,
        }
    }

    /// Whether the dispatcher asks the user before running this kind,
    /// absent a configured policy.
    pub fn confirms_by_default(self) -> bool {
        matches!(
            self,
            ActionKind::CallApi
                | ActionKind::ExecuteCliCommand
                | ActionKind::ReadFile
                | ActionKind::Search
        )
    }

    /// Feedback text when the user refuses the confirmation.
    pub fn refusal_message(self) -> &'static str {
        match self {
            ActionKind::ReadFile => "User refused to read the file",
            ActionKind::CallApi => "User refused to call url",
            ActionKind::Search => "User refused to search",
            ActionKind::ExecuteCliCommand => "User refused to run the command",
            ActionKind::OpenWebpage => "User refused to open the webpage",
            _ => "User refused the action",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ActionKind::GetLib => {
                "Get the help information library, which contains predefined necessary information"
            }
            ActionKind::OpenWebpage => "Open a URL in the user's browser",
            ActionKind::CallApi => "HTTP GET a JSON API with optional query params",
            ActionKind::ExecuteCliCommand => "Run a shell command on the user's machine",
            ActionKind::GetUserInput => "Ask the user a question and wait for one line",
            ActionKind::OutputInformation => "Show information to the user",
            ActionKind::ReadFile => "Read a UTF-8 text file",
            ActionKind::Search => "Search Google for recent results",
        }
    }

    /// Usage line rendered into the system prompt, e.g. `ReadFile(file_path='...')`.
    pub fn signature(self) -> String {
        let params: Vec<String> = self
            .params()
            .iter()
            .map(|p| match p.name {
                "params" | "headers" => format!("{}={{...}}", p.name),
                name => format!("{name}='...'"),
            })
            .collect();
        format!("{}({})", self.name(), params.join(", "))
    }

    /// Exact match on the canonical name or an alias.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name || k.aliases().contains(&name))
    }

    /// Case- and separator-insensitive match (`read_file`, `READ-FILE`, `readfile`).
    pub fn from_loose_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|k| {
            normalize(k.name()) == wanted || k.aliases().iter().any(|a| normalize(a) == wanted)
        })
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The core Action trait.
///
/// Each capability implements this trait. Handlers may return `Err`; the
/// dispatcher turns that into a `Failed` outcome for the model.
#[async_trait]
pub trait Action: Send + Sync {
    /// Which vocabulary entry this handler serves.
    fn kind(&self) -> ActionKind;

    /// Execute with already-validated arguments.
    async fn execute(
        &self,
        arguments: &Arguments,
    ) -> std::result::Result<ActionOutcome, ActionError>;
}

/// Lookup table from action kind to handler.
pub struct ActionRegistry {
    actions: HashMap<ActionKind, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Register a handler. Replaces any existing handler for the same kind.
    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.insert(action.kind(), action);
    }

    pub fn get(&self, kind: ActionKind) -> Option<&dyn Action> {
        self.actions.get(&kind).map(|a| a.as_ref())
    }

    /// Resolve a model-written name to a registered kind.
    pub fn resolve(&self, name: &str) -> Option<ActionKind> {
        let name = name.trim();
        ActionKind::from_name(name)
            .or_else(|| ActionKind::from_loose_name(name))
            .filter(|k| self.actions.contains_key(k))
    }

    /// Registered kinds in vocabulary order.
    pub fn kinds(&self) -> Vec<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .filter(|k| self.actions.contains_key(k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
