//! Code-generation prompt templating
//!
//! This crate handles:
//! - Embedding generated SQL in a prompt for an external coding assistant
//! - Loading custom MiniJinja templates from strings or files
//! - Exposing the parsed tables and vector flags to templates

pub mod renderer;
pub mod context;

pub use renderer::{PromptRenderer, PromptError, DEFAULT_TEMPLATE};
pub use context::{PromptContext, PromptContextBuilder};
