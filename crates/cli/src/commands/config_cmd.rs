//! `sentinel config`: Configuration management commands.

use anyhow::Context;
use sentinel_config::AppConfig;
use sentinel_tools::DigestTrigger;

pub async fn validate() -> anyhow::Result<()> {
    println!("Validating configuration...");

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   Config parsed successfully");

    let warnings = warnings(&config);
    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Provider:     {}", config.default_provider);
    println!("   Model:        {}", config.default_model);
    println!("   Quit token:   {}", config.agent.quit_token);
    println!("   Idle limit:   {}", config.agent.max_idle_turns);
    println!(
        "   Confirm:      {}",
        if config.actions.auto_approve {
            "nothing (auto-approve)".to_string()
        } else {
            config.actions.confirm.join(", ")
        }
    );

    Ok(())
}

/// Non-fatal problems worth pointing out.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.has_api_key() && config.default_provider != "ollama" {
        warnings.push("No API key set (set OPENAI_API_KEY or OPENROUTER_API_KEY env var)".into());
    }
    if config.actions.search.api_key.is_none() || config.actions.search.cse_id.is_none() {
        warnings.push("Search needs GOOGLE_API_KEY and GOOGLE_CSE_ID".into());
    }
    if DigestTrigger::from_config(&config.digest).is_err() {
        warnings.push("No digest trigger configured; `sentinel digest` will fail".into());
    }
    if let Some(path) = &config.agent.knowledge_file
        && !std::path::Path::new(path).exists()
    {
        warnings.push(format!("Knowledge file {path} not found; built-in text is used"));
    }

    warnings
}

pub async fn show() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let mut config = config;
    config.api_key = config.api_key.map(|_| "[REDACTED]".into());
    for provider in config.providers.values_mut() {
        provider.api_key = provider.api_key.take().map(|_| "[REDACTED]".into());
    }
    config.actions.search.api_key = config.actions.search.api_key.map(|_| "[REDACTED]".into());
    config.digest.cron_secret = config.digest.cron_secret.map(|_| "[REDACTED]".into());

    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> anyhow::Result<()> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_path();
        assert!(path.to_str().unwrap().ends_with("config.toml"));
    }

    #[test]
    fn default_config_warns_about_missing_setup() {
        let defaults = warnings(&AppConfig::default());
        assert!(defaults.iter().any(|w| w.contains("API key")));
        assert!(defaults.iter().any(|w| w.contains("digest")));

        let mut config = AppConfig::default();
        config.api_key = Some("sk-test".into());
        config.actions.search.api_key = Some("g".into());
        config.actions.search.cse_id = Some("cx".into());
        config.digest.command = Some("true".into());
        assert!(warnings(&config).is_empty());
    }
}
