pub mod ask;
pub mod chat;
pub mod examples;
pub mod import;
pub mod sql;
pub mod status;

use anyhow::{Context, Error, Result};

use crate::cli::app::GatewayArgs;
use crate::config::{GatewayConfig, GatewayOverrides, RuntimePaths, StoreConfig};
use crate::gateway::OpenAiGateway;
use crate::models::{QueryEnvelope, QueryEnvelopeCommandFailure};
use crate::translator::Translator;

/// Paths and store settings resolved once in `main`.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub runtime_paths: RuntimePaths,
    pub store_config: StoreConfig,
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn build_translator(args: &GatewayArgs) -> Result<Translator> {
    let overrides = GatewayOverrides {
        model: args.model.clone(),
        api_base: args.api_base.clone(),
        timeout_secs: args.timeout_secs,
        max_retries: args.max_retries,
    };
    let config = GatewayConfig::resolve(&overrides, env_lookup)
        .context("invalid language model configuration")?;
    let max_retries = config.max_retries;
    let gateway = OpenAiGateway::new(config)?;
    Ok(Translator::new(Box::new(gateway)).with_max_retries(max_retries))
}

pub fn print_envelope(envelope: &QueryEnvelope) -> Result<()> {
    let encoded = serde_json::to_string(envelope).context("failed to encode command envelope")?;
    println!("{encoded}");
    Ok(())
}

pub fn envelope_failure(envelope: QueryEnvelope) -> Error {
    Error::new(QueryEnvelopeCommandFailure::new(envelope))
}

pub fn policy_failure(envelope: QueryEnvelope) -> Error {
    Error::new(QueryEnvelopeCommandFailure::policy_violation(envelope))
}
