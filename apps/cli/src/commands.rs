//! CLI command definitions, routing, and tracing setup.

use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use agency_core::{ContextAssembler, ExtractionRegistry, OllamaClient, dispatch, model_for};
use agency_fetch::{BrowserOptions, BrowserSession, HttpPageSource, PageSource};
use agency_markdown::TerminalRenderer;
use agency_shared::{
    AppConfig, FetchConfig, FetchMode, config_file_path, init_config, init_config_at, load_config,
    load_config_from,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Agency: context in, the useful part of the answer out.
#[derive(Parser)]
#[command(
    name = "agency",
    version,
    about = "Ask a local model about files, web pages, and plain questions.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.agency/agency.toml).
    #[arg(long, env = "AGENCY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask an agent about files, URLs, or a plain question.
    Ask {
        /// Agent name (case-insensitive).
        agent: String,

        /// File patterns, URLs, or words.
        #[arg(required = true)]
        tokens: Vec<String>,

        /// Extraction strategy for the reply (see `agency strategies`).
        #[arg(short, long)]
        extract: Option<String>,
    },

    /// Print the context assembled from the given tokens.
    Context {
        /// File patterns, URLs, or words.
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Apply an extraction strategy to text from a file or stdin.
    Extract {
        /// Strategy name (defaults to `[defaults] extract`).
        #[arg(short, long)]
        strategy: Option<String>,

        /// Input file; stdin when omitted.
        file: Option<PathBuf>,
    },

    /// List extraction strategies.
    Strategies,

    /// List configured agents.
    Agents,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "agency=warn",
        1 => "agency=info",
        2 => "agency=debug",
        _ => "agency=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.as_deref();
    match cli.command {
        Command::Ask {
            agent,
            tokens,
            extract,
        } => cmd_ask(&load(path)?, &agent, &tokens, extract.as_deref()).await,
        Command::Context { tokens } => cmd_context(&load(path)?, &tokens).await,
        Command::Extract { strategy, file } => {
            cmd_extract(&load(path)?, strategy.as_deref(), file.as_deref())
        }
        Command::Strategies => cmd_strategies(&load(path)?),
        Command::Agents => cmd_agents(&load(path)?),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(path),
            ConfigAction::Show => cmd_config_show(&load(path)?),
        },
    }
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => Ok(load_config_from(path)?),
        None => Ok(load_config()?),
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

/// The page source for URL tokens, plus the browser to shut down afterwards.
struct Pages {
    source: Arc<dyn PageSource>,
    browser: Option<Arc<BrowserSession>>,
}

impl Pages {
    fn from_config(fetch: &FetchConfig) -> Result<Self> {
        match fetch.mode {
            FetchMode::Browser => {
                let session = Arc::new(BrowserSession::new(BrowserOptions {
                    chrome_executable: fetch.chrome_executable.clone(),
                    no_sandbox: fetch.no_sandbox,
                }));
                Ok(Self {
                    source: session.clone(),
                    browser: Some(session),
                })
            }
            FetchMode::Http => Ok(Self {
                source: Arc::new(HttpPageSource::new(Duration::from_secs(fetch.timeout_secs))?),
                browser: None,
            }),
        }
    }

    fn assembler(&self, fetch: &FetchConfig) -> ContextAssembler {
        ContextAssembler::new(self.source.clone()).main_content_only(fetch.main_content_only)
    }

    async fn shutdown(&self) {
        if let Some(browser) = &self.browser {
            browser.shutdown().await;
        }
    }
}

fn extraction_registry(config: &AppConfig) -> Result<ExtractionRegistry> {
    // Piped output stays unstyled.
    let theme = if std::io::stdout().is_terminal() {
        config.render.theme.clone()
    } else {
        "plain".to_string()
    };
    let renderer = TerminalRenderer::new(config.render.width);
    Ok(ExtractionRegistry::new(
        Arc::new(renderer),
        theme,
        &config.extract,
    )?)
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid spinner template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn emit(text: &str) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(
    config: &AppConfig,
    agent: &str,
    tokens: &[String],
    extract: Option<&str>,
) -> Result<()> {
    let registry = extraction_registry(config)?;
    let ollama = OllamaClient::new(
        &config.ollama.base_url,
        Duration::from_secs(config.ollama.timeout_secs),
    )?;
    let pages = Pages::from_config(&config.fetch)?;
    let assembler = pages.assembler(&config.fetch);

    info!(agent, tokens = tokens.len(), "asking agent");

    let progress = spinner(format!("Asking {agent}..."));
    let reply = dispatch(config, &assembler, &ollama, agent, tokens).await;
    progress.finish_and_clear();
    pages.shutdown().await;

    let reply = reply.wrap_err_with(|| format!("agent {agent:?} failed"))?;
    let strategy = extract.unwrap_or(config.defaults.extract.as_str());
    emit(&registry.extract(strategy, &reply));
    Ok(())
}

async fn cmd_context(config: &AppConfig, tokens: &[String]) -> Result<()> {
    let pages = Pages::from_config(&config.fetch)?;
    let assembler = pages.assembler(&config.fetch);

    let progress = spinner("Assembling context...");
    let context = assembler.assemble(tokens).await;
    progress.finish_and_clear();
    pages.shutdown().await;

    print!("{}", context?);
    Ok(())
}

fn cmd_extract(config: &AppConfig, strategy: Option<&str>, file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("failed to read stdin")?;
            buf
        }
    };

    let registry = extraction_registry(config)?;
    let strategy = strategy.unwrap_or(config.defaults.extract.as_str());
    emit(&registry.extract(strategy, &text));
    Ok(())
}

fn cmd_strategies(config: &AppConfig) -> Result<()> {
    let registry = extraction_registry(config)?;
    for name in registry.list() {
        if name == config.defaults.extract {
            println!("{name} (default)");
        } else {
            println!("{name}");
        }
    }
    Ok(())
}

fn cmd_agents(config: &AppConfig) -> Result<()> {
    if config.agents.is_empty() {
        println!("No agents configured. Add [[agents]] entries to your config file.");
        return Ok(());
    }
    for agent in &config.agents {
        println!("{:<20} {}", agent.name, model_for(agent, config));
    }
    Ok(())
}

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    if let Ok(path) = config_file_path() {
        info!(path = %path.display(), "default config location");
    }
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ask() {
        let cli = Cli::try_parse_from([
            "agency", "-vv", "ask", "Reviewer", "src/*.rs", "https://example.com", "-e", "code",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Ask {
                agent,
                tokens,
                extract,
            } => {
                assert_eq!(agent, "Reviewer");
                assert_eq!(tokens, ["src/*.rs", "https://example.com"]);
                assert_eq!(extract.as_deref(), Some("code"));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn ask_needs_tokens() {
        assert!(Cli::try_parse_from(["agency", "ask", "Reviewer"]).is_err());
    }

    #[test]
    fn extract_reads_optional_file() {
        let cli = Cli::try_parse_from(["agency", "extract", "--strategy", "result"]).unwrap();
        match cli.command {
            Command::Extract { strategy, file } => {
                assert_eq!(strategy.as_deref(), Some("result"));
                assert!(file.is_none());
            }
            _ => panic!("expected extract"),
        }
    }

    #[test]
    fn http_mode_has_no_browser() {
        let fetch = FetchConfig {
            mode: FetchMode::Http,
            ..FetchConfig::default()
        };
        let pages = Pages::from_config(&fetch).unwrap();
        assert!(pages.browser.is_none());
        assert_eq!(pages.source.name(), "http");
    }
}
