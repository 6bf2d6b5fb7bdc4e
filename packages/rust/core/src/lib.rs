//! Core domain logic for Agency.
//!
//! This crate turns input tokens into one context string, builds agent
//! prompts around it, calls the model, and extracts the part of the reply
//! the user asked for.

pub mod agent;
pub mod context;
pub mod extract;
pub mod generate;

pub use agent::{build_prompt, dispatch, model_for};
pub use context::ContextAssembler;
pub use extract::{CustomStrategy, DEFAULT_STRATEGY, ExtractionRegistry, Strategy};
pub use generate::{Generator, OllamaClient};
