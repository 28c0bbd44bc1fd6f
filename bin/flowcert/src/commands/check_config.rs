use anyhow::{Context, Result};
use flowcert_core::CompanionConfig;

/// Print the resolved configuration as JSON
pub(crate) fn check_config(config: &CompanionConfig) -> Result<()> {
    println!("{}", render(config)?);
    if !config.orchestrator.is_available() {
        println!("orchestrator: unavailable, certificates go to {}", config.proxy.base_url);
    }
    Ok(())
}

fn render(config: &CompanionConfig) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to serialize configuration")
}
