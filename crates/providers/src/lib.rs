//! LLM Provider implementations for arXiv Sentinel.
//!
//! All providers implement the `sentinel_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config};
