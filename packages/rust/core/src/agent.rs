//! Agents: prompt layout and dispatch.

use tracing::{info, instrument};

use agency_shared::{AgentConfig, AppConfig, Result};

use crate::context::ContextAssembler;
use crate::generate::Generator;

/// Wrap `context` with the agent's role and instruction.
pub fn build_prompt(context: &str, agent: &AgentConfig) -> String {
    format!(
        "<CONTEXT>\n{context}\n</CONTEXT>\n\nROLE: {}\n\nINSTRUCTION: {}",
        agent.role, agent.instruction
    )
}

/// The agent's own model, else the configured default.
pub fn model_for<'a>(agent: &'a AgentConfig, config: &'a AppConfig) -> &'a str {
    agent
        .model
        .as_deref()
        .unwrap_or(config.defaults.model.as_str())
}

/// Run the agent called `name` over `tokens` and return the raw reply.
///
/// The agent is looked up first, so an unknown name fails before anything
/// is fetched.
#[instrument(skip(config, assembler, generator, tokens), fields(tokens = tokens.len()))]
pub async fn dispatch(
    config: &AppConfig,
    assembler: &ContextAssembler,
    generator: &dyn Generator,
    name: &str,
    tokens: &[String],
) -> Result<String> {
    let agent = config.agent(name)?;
    let model = model_for(agent, config);

    let context = assembler.assemble(tokens).await?;
    let prompt = build_prompt(&context, agent);

    info!(agent = agent.name.as_str(), model, prompt_len = prompt.len(), "dispatching");
    generator.generate(model, &prompt).await
}
