//! The action-dispatch agent loop.
//!
//! The agent follows a **reply → parse → dispatch → feedback** cycle:
//!
//! 1. **Send** the transcript to the language model
//! 2. **Stop** if the reply contains the quit token
//! 3. **Parse** `Action: Name(key=value, ...)` lines out of the reply
//! 4. **Dispatch** each action in order through the registry
//! 5. **Append** exactly one feedback message per action, then loop
//!
//! Replies without actions earn a format reminder; too many in a row end
//! the session.

pub mod directive;
pub mod dispatcher;
pub mod literal;
pub mod loop_runner;
pub mod prompt;
pub mod testing;

pub use directive::{DIRECTIVE_PREFIX, extract_directives, parse_directive};
pub use dispatcher::{ConfirmationPolicy, Dispatcher};
pub use literal::parse_literal;
pub use loop_runner::{AgentLoop, LoopState, SessionOutcome, StopReason, feedback_message};
pub use testing::ScriptedProvider;
