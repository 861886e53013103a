//! Digest trigger: the external `run_digest_job()` entry point.
//!
//! The digest pipeline (arXiv fetch, summarization, email) runs elsewhere,
//! usually as the deployed Vercel cron function. This module only knows how
//! to start it: GET the trigger URL, or run a local command.

use sentinel_config::DigestConfig;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("digest job is not configured: set digest.trigger_url or digest.command")]
    NotConfigured,

    #[error("digest trigger request failed: {0}")]
    Http(String),

    #[error("digest trigger returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("digest command exited with code {code}: {stderr}")]
    Command { code: i32, stderr: String },

    #[error("failed to start digest command: {0}")]
    Io(#[from] std::io::Error),
}

/// How the digest job is started.
#[derive(Debug, Clone)]
pub enum DigestTrigger {
    Url { url: String, secret: Option<String> },
    Command(String),
}

impl DigestTrigger {
    pub fn from_config(config: &DigestConfig) -> Result<Self, DigestError> {
        if let Some(url) = config.trigger_url.as_ref().filter(|u| !u.trim().is_empty()) {
            return Ok(Self::Url {
                url: url.clone(),
                secret: config.cron_secret.clone(),
            });
        }
        if let Some(command) = config.command.as_ref().filter(|c| !c.trim().is_empty()) {
            return Ok(Self::Command(command.clone()));
        }
        Err(DigestError::NotConfigured)
    }

    /// Start the job and wait for it to report back. Returns the job's output.
    pub async fn run_digest_job(&self) -> Result<String, DigestError> {
        match self {
            Self::Url { url, secret } => trigger_url(url, secret.as_deref()).await,
            Self::Command(command) => run_command(command).await,
        }
    }
}

async fn trigger_url(url: &str, secret: Option<&str>) -> Result<String, DigestError> {
    // The job summarizes papers before it answers; allow it minutes.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| DigestError::Http(e.to_string()))?;

    info!(url = %url, "Triggering digest job");
    let mut request = client.get(url);
    if let Some(secret) = secret {
        request = request.bearer_auth(secret);
    }

    let response = request
        .send()
        .await
        .map_err(|e| DigestError::Http(e.to_string()))?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if !status.is_success() {
        return Err(DigestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

async fn run_command(command: &str) -> Result<String, DigestError> {
    debug!(command = %command, "Running digest command");
    let output = if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", command]).output().await?
    } else {
        Command::new("sh").args(["-c", command]).output().await?
    };

    if !output.status.success() {
        return Err(DigestError::Command {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
