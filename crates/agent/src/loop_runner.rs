//! The agent loop: model reply → directives → dispatch → feedback.

use crate::directive::extract_directives;
use crate::dispatcher::Dispatcher;
use crate::prompt;
use sentinel_config::AppConfig;
use sentinel_core::action::{ActionCall, ActionOutcome};
use sentinel_core::error::ProviderError;
use sentinel_core::message::{Message, Transcript};
use sentinel_core::provider::{Provider, ProviderRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_QUIT_TOKEN: &str = "<<END_SESSION>>";
pub const DEFAULT_MAX_IDLE_TURNS: u32 = 3;

/// Where the loop is within one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingModel,
    Parsing(String),
    Dispatching(Vec<ActionCall>),
    Feedback(Vec<(ActionCall, ActionOutcome)>),
    Terminated(StopReason),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model emitted the quit token
    QuitToken,
    /// Too many consecutive replies without an action
    IdleLimit,
    /// The model invocation budget was used up
    TurnLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::QuitToken => "quit token received",
            Self::IdleLimit => "too many replies without actions",
            Self::TurnLimit => "turn limit reached",
        })
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub stop_reason: StopReason,
    /// Model invocations
    pub turns: u32,
    pub actions_executed: u32,
    pub failures: u32,
    pub declined: u32,
}

/// Drives one conversation until the quit token or a limit.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    dispatcher: Dispatcher,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    quit_token: String,
    max_idle_turns: u32,
    max_turns: Option<u32>,
}

impl AgentLoop {
    pub fn new(provider: Arc<dyn Provider>, dispatcher: Dispatcher, model: impl Into<String>) -> Self {
        Self {
            provider,
            dispatcher,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            quit_token: DEFAULT_QUIT_TOKEN.into(),
            max_idle_turns: DEFAULT_MAX_IDLE_TURNS,
            max_turns: None,
        }
    }

    /// Apply sampling and termination settings from the loaded config.
    pub fn configure(self, config: &AppConfig) -> Self {
        self.with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_quit_token(config.agent.quit_token.clone())
            .with_max_idle_turns(config.agent.max_idle_turns)
            .with_max_turns(config.agent.max_turns)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_quit_token(mut self, token: impl Into<String>) -> Self {
        self.quit_token = token.into();
        self
    }

    /// Consecutive action-less replies tolerated before giving up. Minimum 1.
    pub fn with_max_idle_turns(mut self, max: u32) -> Self {
        self.max_idle_turns = max.max(1);
        self
    }

    pub fn with_max_turns(mut self, max: Option<u32>) -> Self {
        self.max_turns = max;
        self
    }

    pub fn quit_token(&self) -> &str {
        &self.quit_token
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Build a transcript seeded with instructions for the registered actions.
    pub fn start_transcript(
        &self,
        knowledge: &str,
        instructions_override: Option<&str>,
        window: Option<usize>,
    ) -> Transcript {
        let kinds = self.dispatcher.registry().kinds();
        let seed = prompt::seed_messages(&kinds, knowledge, &self.quit_token, instructions_override);
        Transcript::seeded(seed).with_window(window)
    }

    /// Run the conversation to completion.
    ///
    /// Action failures become feedback text; only provider errors end the
    /// session with an `Err`.
    pub async fn run(&self, transcript: &mut Transcript) -> Result<SessionOutcome, ProviderError> {
        let mut turns: u32 = 0;
        let mut idle: u32 = 0;
        let mut actions_executed: u32 = 0;
        let mut failures: u32 = 0;
        let mut declined: u32 = 0;

        let mut state = LoopState::AwaitingModel;
        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if let Some(max) = self.max_turns
                        && turns >= max
                    {
                        LoopState::Terminated(StopReason::TurnLimit)
                    } else {
                        turns += 1;
                        let reply = self.invoke_model(transcript, turns).await?;
                        if reply.contains(&self.quit_token) {
                            info!(turn = turns, "Quit token received");
                            LoopState::Terminated(StopReason::QuitToken)
                        } else {
                            LoopState::Parsing(reply)
                        }
                    }
                }

                LoopState::Parsing(reply) => {
                    let calls = extract_directives(&reply);
                    if !calls.is_empty() {
                        idle = 0;
                        LoopState::Dispatching(calls)
                    } else {
                        idle += 1;
                        warn!(turn = turns, idle, "Reply contained no actions");
                        if idle >= self.max_idle_turns {
                            LoopState::Terminated(StopReason::IdleLimit)
                        } else {
                            transcript.push(Message::user(prompt::format_reminder(&self.quit_token)));
                            LoopState::AwaitingModel
                        }
                    }
                }

                LoopState::Dispatching(calls) => {
                    let mut results = Vec::with_capacity(calls.len());
                    for call in calls {
                        let outcome = self.dispatcher.execute(&call).await;
                        actions_executed += 1;
                        match &outcome {
                            ActionOutcome::Failed(_) => failures += 1,
                            ActionOutcome::Declined(_) => declined += 1,
                            _ => {}
                        }
                        results.push((call, outcome));
                    }
                    LoopState::Feedback(results)
                }

                LoopState::Feedback(results) => {
                    for (call, outcome) in results {
                        let name = self.dispatcher.display_name(&call.name);
                        transcript.push(feedback_message(&name, outcome));
                    }
                    LoopState::AwaitingModel
                }

                LoopState::Terminated(stop_reason) => {
                    let outcome = SessionOutcome {
                        stop_reason,
                        turns,
                        actions_executed,
                        failures,
                        declined,
                    };
                    info!(
                        stop = ?stop_reason,
                        turns,
                        actions = actions_executed,
                        failures,
                        "Session finished"
                    );
                    return Ok(outcome);
                }
            };
        }
    }

    async fn invoke_model(&self, transcript: &mut Transcript, turn: u32) -> Result<String, ProviderError> {
        debug!(
            turn,
            messages = transcript.len(),
            evicted = transcript.evicted(),
            "Invoking model"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: transcript.messages(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(turn, tokens = usage.total_tokens, model = %response.model, "Model replied");
        }

        let reply = response.message.content.clone();
        transcript.push(response.message);
        Ok(reply)
    }
}

/// The single transcript message reporting one action's outcome.
pub fn feedback_message(action: &str, outcome: ActionOutcome) -> Message {
    match outcome {
        ActionOutcome::Acknowledged => Message::user(format!("{action} executed.")),
        ActionOutcome::Reply { text, notice: None } => Message::user(text),
        ActionOutcome::Reply {
            text,
            notice: Some(notice),
        } => Message::user(format!("{notice}\n{text}")),
        ActionOutcome::Content { source, body } => Message::user(format!("[{source}]\n{body}")),
        ActionOutcome::Knowledge(text) => Message::system(text),
        ActionOutcome::Declined(text) | ActionOutcome::Failed(text) => Message::user(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ConfirmationPolicy;
    use crate::testing::ScriptedProvider;
    use sentinel_core::action::ActionRegistry;
    use sentinel_core::message::Role;
    use sentinel_tools::console::ScriptedConsole;
    use sentinel_tools::file_read::ReadFileAction;
    use sentinel_tools::knowledge_base::GetLibAction;
    use sentinel_tools::user_io::{GetUserInputAction, OutputInformationAction};

    fn agent(provider: Arc<ScriptedProvider>, console: Arc<ScriptedConsole>) -> AgentLoop {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(GetLibAction::new("vercel dev")));
        registry.register(Box::new(GetUserInputAction::new(console.clone())));
        registry.register(Box::new(OutputInformationAction::new(console.clone())));
        registry.register(Box::new(ReadFileAction::new()));
        let dispatcher = Dispatcher::new(registry, console).with_policy(ConfirmationPolicy::defaults());
        AgentLoop::new(provider, dispatcher, "scripted-model")
    }

    fn turns(transcript: &Transcript) -> Vec<(Role, String)> {
        transcript
            .turns()
            .map(|m| (m.role, m.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn quit_token_stops_without_further_calls() {
        let provider = Arc::new(ScriptedProvider::new([
            "Action: OutputInformation(info='hi')",
            "All done. <<END_SESSION>>",
            "Action: GetLib()",
        ]));
        let console = Arc::new(ScriptedConsole::default());
        let agent = agent(provider.clone(), console.clone());
        let mut transcript = agent.start_transcript("kb", None, None);

        let outcome = agent.run(&mut transcript).await.unwrap();

        assert_eq!(outcome.stop_reason, StopReason::QuitToken);
        assert_eq!(outcome.turns, 2);
        assert_eq!(outcome.actions_executed, 1);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.remaining(), 1);
        assert_eq!(console.displayed(), vec!["hi".to_string()]);
        assert_eq!(
            turns(&transcript)[1],
            (Role::User, "OutputInformation executed.".to_string())
        );
    }

    #[tokio::test]
    async fn actions_in_the_quitting_reply_are_not_run() {
        let provider = Arc::new(ScriptedProvider::new([
            "Action: OutputInformation(info='bye')\n<<END_SESSION>>",
        ]));
        let console = Arc::new(ScriptedConsole::default());
        let agent = agent(provider, console.clone());
        let mut transcript = agent.start_transcript("", None, None);

        let outcome = agent.run(&mut transcript).await.unwrap();

        assert_eq!(outcome.actions_executed, 0);
        assert!(console.displayed().is_empty());
    }

    #[tokio::test]
    async fn user_input_becomes_the_next_message() {
        let provider = Arc::new(ScriptedProvider::new([
            "Action: GetUserInput(prompt='Please tell me the arXiv topic you like')",
            "<<END_SESSION>>",
        ]));
        let console = Arc::new(ScriptedConsole::new(["cs.AI"]));
        let agent = agent(provider.clone(), console.clone());
        let mut transcript = agent.start_transcript("kb", None, None);

        agent.run(&mut transcript).await.unwrap();

        let second = &provider.requests()[1];
        let last = second.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content, "cs.AI");
        assert_eq!(
            console.prompts(),
            vec!["Please tell me the arXiv topic you like ".to_string()]
        );
    }

    #[tokio::test]
    async fn every_action_gets_one_feedback_message_in_order() {
        let provider = Arc::new(ScriptedProvider::new([
            "Action: GetLib()\nAction: Teleport(x=1)\nAction: ReadFile(file_path='secret.txt')",
            "<<END_SESSION>>",
        ]));
        let console = Arc::new(ScriptedConsole::new(["n"]));
        let agent = agent(provider.clone(), console);
        let mut transcript = agent.start_transcript("", None, None);

        let outcome = agent.run(&mut transcript).await.unwrap();

        assert_eq!(outcome.actions_executed, 3);
        assert_eq!(outcome.failures, 1);
        assert_eq!(outcome.declined, 1);

        let turns = turns(&transcript);
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[1], (Role::System, "vercel dev".to_string()));
        assert_eq!(turns[2], (Role::User, "Unknown action: Teleport".to_string()));
        assert_eq!(
            turns[3],
            (Role::User, "User refused to read the file".to_string())
        );
        assert_eq!(turns[4].0, Role::Assistant);

        // The second request saw all three feedback messages.
        assert_eq!(provider.requests()[1].messages.len(), transcript.seed_len() + 4);
    }

    #[tokio::test]
    async fn idle_replies_get_a_reminder_then_stop() {
        let provider = Arc::new(ScriptedProvider::new(["thinking", "still thinking", "hmm", "unused"]));
        let agent = agent(provider.clone(), Arc::new(ScriptedConsole::default()));
        let mut transcript = agent.start_transcript("", None, None);

        let outcome = agent.run(&mut transcript).await.unwrap();

        assert_eq!(outcome.stop_reason, StopReason::IdleLimit);
        assert_eq!(outcome.turns, 3);
        let second = &provider.requests()[1];
        let last = second.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains(DEFAULT_QUIT_TOKEN));
    }

    #[tokio::test]
    async fn idle_counter_resets_after_an_action() {
        let provider = Arc::new(ScriptedProvider::new([
            "chat",
            "Action: GetLib()",
            "chat",
            "chat",
            "<<END_SESSION>>",
        ]));
        let agent = agent(provider, Arc::new(ScriptedConsole::default())).with_max_idle_turns(2);
        let mut transcript = agent.start_transcript("", None, None);

        let outcome = agent.run(&mut transcript).await.unwrap();
        assert_eq!(outcome.stop_reason, StopReason::IdleLimit);
        assert_eq!(outcome.turns, 4);
    }

    #[tokio::test]
    async fn turn_limit_bounds_model_calls() {
        let provider = Arc::new(ScriptedProvider::new(vec!["Action: GetLib()"; 5]));
        let agent = agent(provider.clone(), Arc::new(ScriptedConsole::default())).with_max_turns(Some(2));
        let mut transcript = agent.start_transcript("", None, None);

        let outcome = agent.run(&mut transcript).await.unwrap();

        assert_eq!(outcome.stop_reason, StopReason::TurnLimit);
        assert_eq!(outcome.turns, 2);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn provider_failure_is_fatal() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let agent = agent(provider, Arc::new(ScriptedConsole::default()));
        let mut transcript = agent.start_transcript("", None, None);

        let err = agent.run(&mut transcript).await.unwrap_err();
        assert!(matches!(err, ProviderError::Exhausted(_)));
    }

    #[tokio::test]
    async fn window_keeps_seed_while_trimming_turns() {
        let provider = Arc::new(ScriptedProvider::new(vec!["Action: GetLib()"; 10]));
        let agent = agent(provider.clone(), Arc::new(ScriptedConsole::default())).with_max_turns(Some(10));
        let mut transcript = agent.start_transcript("kb", None, Some(4));

        agent.run(&mut transcript).await.unwrap();

        assert_eq!(transcript.turns().count(), 4);
        assert!(transcript.evicted() > 0);
        let last_request = provider.requests().pop().unwrap();
        assert_eq!(last_request.messages[0].role, Role::System);
        assert!(last_request.messages[0].content.contains("arXiv Sentinel"));
    }

    #[test]
    fn feedback_shapes() {
        let m = feedback_message("ReadFile", ActionOutcome::content(".env.local", "A=1"));
        assert_eq!(m.content, "[.env.local]\nA=1");
        assert_eq!(m.role, Role::User);

        let m = feedback_message(
            "GetUserInput",
            ActionOutcome::Reply {
                text: "cs.AI".into(),
                notice: Some("no prompt given".into()),
            },
        );
        assert_eq!(m.content, "no prompt given\ncs.AI");

        let m = feedback_message("GetLib", ActionOutcome::Knowledge("kb".into()));
        assert_eq!(m.role, Role::System);
    }
}
