//! `sentinel chat`: Run one agent session in the terminal.

use anyhow::{Context, anyhow, bail};
use sentinel_agent::{AgentLoop, ConfirmationPolicy, Dispatcher, StopReason};
use sentinel_config::AppConfig;
use sentinel_core::console::Console;
use sentinel_core::message::Message;
use sentinel_tools::{TerminalConsole, default_registry, load_knowledge};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(message: Option<String>, model: Option<String>, yes: bool) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    // Local Ollama is the only provider that works without a key.
    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY='sk-...'          (OpenAI)");
        eprintln!("    export OPENROUTER_API_KEY='sk-or-v1-...' (OpenRouter)");
        eprintln!("    export SENTINEL_API_KEY='...'           (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    }

    let router = sentinel_providers::build_from_config(&config);
    let requested = model.unwrap_or_else(|| config.default_model.clone());
    let (provider, model) = router
        .resolve(&requested)
        .ok_or_else(|| anyhow!("No provider available for model '{requested}'"))?;

    let knowledge_path = config
        .agent
        .knowledge_file
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_knowledge_path);
    let knowledge = load_knowledge(Some(&knowledge_path));
    info!(provider = %provider.name(), model = %model, knowledge = %knowledge_path.display(), "Starting session");

    let console: Arc<dyn Console> = Arc::new(TerminalConsole::new());
    let registry = default_registry(&config.actions, knowledge.clone(), console.clone());
    let policy = ConfirmationPolicy::from_config(&config.actions)
        .with_auto_approve(yes || config.actions.auto_approve);
    let dispatcher = Dispatcher::new(registry, console.clone())
        .with_policy(policy)
        .with_max_output_bytes(config.actions.max_output_bytes);

    let agent = AgentLoop::new(provider.clone(), dispatcher, &model).configure(&config);
    let mut transcript = agent.start_transcript(
        &knowledge,
        config.agent.system_prompt_override.as_deref(),
        config.agent.transcript_window,
    );
    println!();
    println!("  arXiv Sentinel — Agent Session");
    println!("  Provider:  {}", provider.name());
    println!("  Model:     {model}");
    println!(
        "  Actions:   {}",
        agent
            .dispatcher()
            .registry()
            .kinds()
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if yes || config.actions.auto_approve {
        println!("  Confirmations are OFF; every action runs without asking.");
    }
    println!();

    if let Some(request) = opening_request(message, console.as_ref()).await? {
        transcript.push(Message::user(request));
    }

    let outcome = agent
        .run(&mut transcript)
        .await
        .context("Language model request failed")?;

    println!();
    match outcome.stop_reason {
        StopReason::QuitToken => println!("  Session complete."),
        other => println!("  Session stopped: {other}."),
    }
    println!(
        "  {} model turns, {} actions ({} failed, {} declined)",
        outcome.turns, outcome.actions_executed, outcome.failures, outcome.declined
    );
    println!();

    Ok(())
}

/// The user's first request: `--message` if given, otherwise one console line.
/// A blank answer leaves the opening move to the model.
async fn opening_request(
    message: Option<String>,
    console: &dyn Console,
) -> anyhow::Result<Option<String>> {
    let request = match message {
        Some(msg) => msg,
        None => console
            .read_line("User: ")
            .await
            .context("Failed to read the opening request")?,
    };
    let request = request.trim();
    Ok((!request.is_empty()).then(|| request.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_tools::ScriptedConsole;

    #[tokio::test]
    async fn message_flag_skips_the_prompt() {
        let console = ScriptedConsole::default();
        let request = opening_request(Some("deploy to vercel".into()), &console)
            .await
            .unwrap();
        assert_eq!(request.as_deref(), Some("deploy to vercel"));
        assert!(console.prompts().is_empty());
    }

    #[tokio::test]
    async fn without_message_the_user_is_asked() {
        let console = ScriptedConsole::new(["  set up arXiv Sentinel for cs.AI  "]);
        let request = opening_request(None, &console).await.unwrap();
        assert_eq!(request.as_deref(), Some("set up arXiv Sentinel for cs.AI"));
        assert_eq!(console.prompts(), vec!["User: ".to_string()]);
    }

    #[tokio::test]
    async fn blank_answer_adds_no_user_turn() {
        let console = ScriptedConsole::new([""]);
        assert!(opening_request(None, &console).await.unwrap().is_none());
    }
}
