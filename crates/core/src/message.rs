//! Message and Transcript domain types.
//!
//! The transcript is the agent's only memory: every model reply and every
//! action result is appended here before the next model call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions, knowledge base, constraints
    System,
    /// The human, or action feedback on their behalf
    User,
    /// The language model
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// The ordered conversation history shared between the model and the loop.
///
/// Seed messages (instructions, knowledge base, constraints) are pinned.
/// Everything appended afterwards lives in a sliding window: when a window
/// size is set, the oldest non-seed messages are dropped first. Retained
/// messages are never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    seed: Vec<Message>,
    turns: VecDeque<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    window: Option<usize>,
    #[serde(default)]
    evicted: usize,
}

impl Transcript {
    /// Create a transcript pinned to the given seed messages, unbounded.
    pub fn seeded(seed: Vec<Message>) -> Self {
        Self {
            seed,
            turns: VecDeque::new(),
            window: None,
            evicted: 0,
        }
    }

    /// Retain at most `window` non-seed messages. `None` disables the cap.
    pub fn with_window(mut self, window: Option<usize>) -> Self {
        self.window = window;
        self.enforce_window();
        self
    }

    /// Append a message, evicting the oldest turn messages if over the window.
    pub fn push(&mut self, message: Message) {
        self.turns.push_back(message);
        self.enforce_window();
    }

    fn enforce_window(&mut self) {
        let Some(window) = self.window else {
            return;
        };
        while self.turns.len() > window {
            self.turns.pop_front();
            self.evicted += 1;
        }
    }

    /// All retained messages in order: seed first, then the window.
    pub fn messages(&self) -> Vec<Message> {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.seed.iter().chain(self.turns.iter())
    }

    /// Messages appended after the seed that are still retained.
    pub fn turns(&self) -> impl Iterator<Item = &Message> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.turns.back().or_else(|| self.seed.last())
    }

    pub fn len(&self) -> usize {
        self.seed.len() + self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn seed_len(&self) -> usize {
        self.seed.len()
    }

    /// How many messages the window has dropped so far.
    pub fn evicted(&self) -> usize {
        self.evicted
    }
}
