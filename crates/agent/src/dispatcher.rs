//! Dispatcher: turns one parsed ActionCall into exactly one ActionOutcome.
//!
//! Resolution, parameter checks, the confirmation gate and handler failures
//! all end up as outcomes. Nothing here returns an error or lets a handler
//! panic escape.

use futures::FutureExt;
use sentinel_config::ActionsConfig;
use sentinel_core::action::{ActionCall, ActionKind, ActionOutcome, ActionRegistry};
use sentinel_core::console::Console;
use sentinel_core::error::ActionError;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which action kinds need an explicit "yes" before running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    confirm: BTreeSet<ActionKind>,
    auto_approve: bool,
}

impl ConfirmationPolicy {
    /// The built-in defaults: run-command, read-file, call-api and search.
    pub fn defaults() -> Self {
        Self {
            confirm: ActionKind::ALL
                .into_iter()
                .filter(|k| k.confirms_by_default())
                .collect(),
            auto_approve: false,
        }
    }

    /// Never ask.
    pub fn auto_approve() -> Self {
        Self {
            confirm: BTreeSet::new(),
            auto_approve: true,
        }
    }

    pub fn from_config(config: &ActionsConfig) -> Self {
        let confirm = config
            .confirm
            .iter()
            .filter_map(|name| {
                let kind = ActionKind::from_name(name).or_else(|| ActionKind::from_loose_name(name));
                if kind.is_none() {
                    warn!(action = %name, "Ignoring unknown action in confirmation list");
                }
                kind
            })
            .collect();
        Self {
            confirm,
            auto_approve: config.auto_approve,
        }
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn requires(&self, kind: ActionKind) -> bool {
        !self.auto_approve && self.confirm.contains(&kind)
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

pub struct Dispatcher {
    registry: ActionRegistry,
    console: Arc<dyn Console>,
    policy: ConfirmationPolicy,
    max_output_bytes: Option<usize>,
}

impl Dispatcher {
    pub fn new(registry: ActionRegistry, console: Arc<dyn Console>) -> Self {
        Self {
            registry,
            console,
            policy: ConfirmationPolicy::defaults(),
            max_output_bytes: None,
        }
    }

    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cap `Content` bodies fed back to the model.
    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = Some(max);
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// The canonical name for feedback, or the name as written if unknown.
    pub fn display_name(&self, name: &str) -> String {
        self.registry
            .resolve(name)
            .map(|k| k.name().to_string())
            .unwrap_or_else(|| name.trim().to_string())
    }

    pub async fn execute(&self, call: &ActionCall) -> ActionOutcome {
        let Some(kind) = self.registry.resolve(&call.name) else {
            warn!(action = %call.name, "Unknown action");
            return ActionOutcome::Failed(format!("Unknown action: {}", call.name));
        };

        if let Some(missing) = kind
            .required_params()
            .find(|p| call.arguments.get(*p).is_none_or(|v| v.is_null()))
        {
            warn!(action = %kind, parameter = missing, "Missing required parameter");
            return ActionOutcome::Failed(format!(
                "Missing '{missing}' parameter in {kind} action."
            ));
        }

        if self.policy.requires(kind) {
            let question = confirmation_question(kind, call);
            match self.console.confirm(&question).await {
                Ok(true) => debug!(action = %kind, "User approved action"),
                Ok(false) => {
                    info!(action = %kind, "User declined action");
                    return ActionOutcome::Declined(kind.refusal_message().to_string());
                }
                Err(e) => return ActionOutcome::Failed(failure_text(kind, &e)),
            }
        }

        let Some(action) = self.registry.get(kind) else {
            return ActionOutcome::Failed(format!("Unknown action: {}", call.name));
        };

        info!(action = %kind, "Dispatching action");
        let result = AssertUnwindSafe(action.execute(&call.arguments))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(outcome)) => self.cap_output(outcome),
            Ok(Err(e)) => {
                warn!(action = %kind, error = %e, "Action failed");
                ActionOutcome::Failed(failure_text(kind, &e))
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!(action = %kind, reason = %reason, "Action panicked");
                ActionOutcome::Failed(format!("Error executing {kind}: {reason}"))
            }
        }
    }

    fn cap_output(&self, outcome: ActionOutcome) -> ActionOutcome {
        let (Some(max), ActionOutcome::Content { source, body }) = (self.max_output_bytes, &outcome)
        else {
            return outcome;
        };
        if body.len() <= max {
            return outcome;
        }

        let mut cut = max;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        ActionOutcome::Content {
            source: source.clone(),
            body: format!(
                "{}\n... [truncated {} bytes]",
                &body[..cut],
                body.len() - cut
            ),
        }
    }
}

fn confirmation_question(kind: ActionKind, call: &ActionCall) -> String {
    let arg = |key: &str| {
        call.arguments
            .get(key)
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    };

    match kind {
        ActionKind::ReadFile => format!("Read file: {}.", arg("file_path")),
        ActionKind::CallApi => {
            let params = call
                .arguments
                .get("params")
                .map(|p| p.to_string())
                .unwrap_or_else(|| "{}".into());
            format!("Call url: {}. Params: {params}.", arg("url"))
        }
        ActionKind::Search => format!("Google Search: {}.", arg("query")),
        ActionKind::ExecuteCliCommand => format!("Run command: {}.", arg("command")),
        ActionKind::OpenWebpage => format!("Open webpage: {}.", arg("url")),
        other => format!("Run {other}?"),
    }
}

fn failure_text(kind: ActionKind, error: &ActionError) -> String {
    match error {
        ActionError::ExecutionFailed { reason, .. } => format!("Error executing {kind}: {reason}"),
        other => format!("Error executing {kind}: {other}"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("action panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("action panicked: {s}")
    } else {
        "action panicked".to_string()
    }
}
