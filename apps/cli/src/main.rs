//! Agency CLI: assemble context from files, URLs, and terms, ask a local
//! model through a configured agent, and extract the part of the reply
//! you need.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
