//! # Sentinel Core
//!
//! Domain types, traits, and error definitions for the arXiv Sentinel agent.
//! This crate has **no I/O of its own**: it defines the model that the
//! provider, tool, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external boundary is a trait here:
//! - [`Provider`] for the language model
//! - [`Action`] for a capability in the closed action vocabulary
//! - [`Console`] for the human in the loop
//!
//! Implementations live in their respective crates, which keeps the agent
//! loop testable with scripted stand-ins.

pub mod action;
pub mod console;
pub mod error;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use action::{
    Action, ActionCall, ActionKind, ActionOutcome, ActionRegistry, Arguments, ParamSpec,
    SideEffect,
};
pub use console::Console;
pub use error::{ActionError, Error, ProviderError, Result};
pub use message::{Message, Role, Transcript};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
