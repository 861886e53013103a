//! `sentinel onboard`: First-time setup.

use sentinel_config::AppConfig;
use sentinel_tools::DEFAULT_KNOWLEDGE;
use std::path::Path;

pub async fn run() -> anyhow::Result<()> {
    let config_dir = AppConfig::config_dir();
    println!("arXiv Sentinel — First-Time Setup");
    println!("=================================\n");

    let created = initialize(&config_dir)?;
    for path in &created {
        println!("  Created {}", path.display());
    }

    let config_path = config_dir.join("config.toml");
    if created.iter().any(|p| p == &config_path) {
        println!("\nNext steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!("      (or export OPENAI_API_KEY)");
        println!("   2. Optionally fill in knowledge.md with your own notes");
        println!("   3. Run: sentinel chat\n");
    } else {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete it and re-run onboard.\n");
    }

    Ok(())
}

/// Create the config directory, `config.toml` and `knowledge.md`, leaving
/// existing files alone. Returns the paths that were created.
pub fn initialize(config_dir: &Path) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut created = Vec::new();

    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)?;
        created.push(config_dir.to_path_buf());
    }

    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        created.push(config_path);
    }

    let knowledge_path = config_dir.join("knowledge.md");
    if !knowledge_path.exists() {
        std::fs::write(&knowledge_path, DEFAULT_KNOWLEDGE)?;
        created.push(knowledge_path);
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_creates_files_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join(".arxiv-sentinel");

        let created = initialize(&dir).unwrap();
        assert_eq!(created.len(), 3);

        let config = AppConfig::load_from(&dir.join("config.toml")).unwrap();
        assert_eq!(config.agent.quit_token, "<<END_SESSION>>");
        let knowledge = std::fs::read_to_string(dir.join("knowledge.md")).unwrap();
        assert_eq!(knowledge, DEFAULT_KNOWLEDGE);

        std::fs::write(dir.join("knowledge.md"), "my notes").unwrap();
        assert!(initialize(&dir).unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(dir.join("knowledge.md")).unwrap(), "my notes");
    }
}
