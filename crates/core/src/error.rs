//! Error types for the Sentinel domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each boundary has its own error enum.

use thiserror::Error;

/// The top-level error type for all Sentinel operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Action errors ---
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Boundary errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider has no more replies: {0}")]
    Exhausted(String),
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Missing '{parameter}' parameter in {action} action")]
    MissingParameter { action: String, parameter: String },

    #[error("Invalid '{parameter}' parameter in {action} action: {reason}")]
    InvalidParameter {
        action: String,
        parameter: String,
        reason: String,
    },

    #[error("{action} failed: {reason}")]
    ExecutionFailed { action: String, reason: String },

    #[error("Console unavailable: {0}")]
    Console(String),
}

impl ActionError {
    /// Shorthand for an execution failure of a named action.
    pub fn failed(action: impl Into<String>, reason: impl ToString) -> Self {
        Self::ExecutionFailed {
            action: action.into(),
            reason: reason.to_string(),
        }
    }
}
