//! Application configuration for Agency.
//!
//! User config lives at `~/.agency/agency.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AgencyError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "agency.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".agency";

// ---------------------------------------------------------------------------
// Config structs (matching agency.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Ollama server settings.
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// How URL tokens are fetched.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Terminal rendering of extracted text.
    #[serde(default)]
    pub render: RenderConfig,

    /// Extraction strategy settings.
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Configured agents.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

impl AppConfig {
    /// Find an agent by name, ignoring case.
    pub fn agent(&self, name: &str) -> Result<&AgentConfig> {
        self.agents
            .iter()
            .find(|agent| agent.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AgencyError::config(format!("no matching agent for {name:?}")))
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Extraction strategy applied to generated text.
    #[serde(default = "default_extract")]
    pub extract: String,

    /// Model used when an agent does not name one.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            extract: default_extract(),
            model: default_model(),
        }
    }
}

fn default_extract() -> String {
    "default".into()
}
fn default_model() -> String {
    "deepseek-r1".into()
}

/// `[ollama]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    /// Request timeout for a single generation, in seconds.
    #[serde(default = "default_ollama_timeout")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            timeout_secs: default_ollama_timeout(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}
fn default_ollama_timeout() -> u64 {
    300
}

/// Page source used for URL tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Headless Chromium; sees the DOM after scripts run.
    #[default]
    Browser,
    /// Plain HTTP GET of the served HTML.
    Http,
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Browser or plain HTTP.
    #[serde(default)]
    pub mode: FetchMode,

    /// Chrome/Chromium binary; auto-detected when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_executable: Option<PathBuf>,

    /// Launch the browser with `--no-sandbox`.
    #[serde(default)]
    pub no_sandbox: bool,

    /// Convert only the main content container instead of the whole body.
    #[serde(default)]
    pub main_content_only: bool,

    /// Timeout for HTTP page fetches, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            chrome_executable: None,
            no_sandbox: false,
            main_content_only: false,
            timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    30
}

/// `[render]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Theme name: `dark`, `light`, or `plain`.
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Wrap width; the terminal width when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            width: None,
        }
    }
}

fn default_theme() -> String {
    "dark".into()
}

/// `[extract]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Opening reasoning marker removed by the `result` strategy.
    #[serde(default = "default_reasoning_open")]
    pub reasoning_open: String,

    /// Closing reasoning marker.
    #[serde(default = "default_reasoning_close")]
    pub reasoning_close: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            reasoning_open: default_reasoning_open(),
            reasoning_close: default_reasoning_close(),
        }
    }
}

fn default_reasoning_open() -> String {
    "<think>".into()
}
fn default_reasoning_close() -> String {
    "</think>".into()
}

/// `[[agents]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name used to select the agent (case-insensitive).
    pub name: String,
    /// Model override; `[defaults] model` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Role line placed in the prompt.
    #[serde(default)]
    pub role: String,
    /// Instruction placed in the prompt.
    #[serde(default)]
    pub instruction: String,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.agency/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AgencyError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.agency/agency.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AgencyError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| AgencyError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `~/.agency/agency.toml`.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| AgencyError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| AgencyError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| AgencyError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
