//! `sentinel actions`: List the action vocabulary.

use sentinel_agent::ConfirmationPolicy;
use sentinel_config::AppConfig;
use sentinel_core::action::{ActionKind, SideEffect};

pub async fn run() -> anyhow::Result<()> {
    let policy = match AppConfig::load() {
        Ok(config) => ConfirmationPolicy::from_config(&config.actions),
        Err(e) => {
            eprintln!("  (config not loaded: {e}; showing defaults)");
            ConfirmationPolicy::defaults()
        }
    };

    println!("Available Actions");
    println!("=================");
    println!();
    for line in render(&policy) {
        println!("{line}");
    }
    println!();
    println!("  Directive format:  Action: Name(param='value', other={{'k': 1}})");

    Ok(())
}

fn render(policy: &ConfirmationPolicy) -> Vec<String> {
    ActionKind::ALL
        .iter()
        .map(|kind| {
            let confirm = if policy.requires(*kind) { "asks first" } else { "runs directly" };
            let effect = match kind.side_effect() {
                SideEffect::ReadExternal => "reads",
                SideEffect::WriteExternal => "writes",
                SideEffect::PromptUser => "prompts",
                SideEffect::Informational => "info",
            };
            format!(
                "  {:<45} {:<8} {:<14} {}",
                kind.signature(),
                effect,
                confirm,
                kind.description()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_action_with_policy() {
        let lines = render(&ConfirmationPolicy::defaults());
        assert_eq!(lines.len(), ActionKind::ALL.len());
        let read_file = lines.iter().find(|l| l.contains("ReadFile(")).unwrap();
        assert!(read_file.contains("asks first"));
        let output = lines.iter().find(|l| l.contains("OutputInformation(")).unwrap();
        assert!(output.contains("runs directly"));

        let approved = render(&ConfirmationPolicy::auto_approve());
        assert!(approved.iter().all(|l| !l.contains("asks first")));
    }
}
