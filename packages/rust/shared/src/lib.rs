//! Shared types, error model, and configuration for Agency.
//!
//! This crate is the foundation depended on by all other Agency crates.
//! It provides:
//! - [`AgencyError`]: the unified error type
//! - Domain types ([`InputKind`], [`AgentConfig`])
//! - Configuration ([`AppConfig`] and its sections, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AgentConfig, AppConfig, DefaultsConfig, ExtractConfig, FetchConfig, FetchMode, OllamaConfig,
    RenderConfig, config_dir, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
pub use error::{AgencyError, Result};
pub use types::InputKind;
