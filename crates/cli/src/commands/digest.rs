//! `sentinel digest`: Run the paper digest job once.

use anyhow::Context;
use sentinel_config::AppConfig;
use sentinel_tools::DigestTrigger;

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let trigger = DigestTrigger::from_config(&config.digest)?;

    match &trigger {
        DigestTrigger::Url { url, .. } => println!("Triggering digest job at {url} ..."),
        DigestTrigger::Command(command) => println!("Running digest command: {command}"),
    }

    let output = trigger.run_digest_job().await?;
    println!("Digest job finished.");
    if config.digest.show_output && !output.trim().is_empty() {
        println!();
        println!("{}", output.trim_end());
    }

    Ok(())
}
