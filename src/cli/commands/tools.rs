//! Tool listing and direct tool invocation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::ToolRegistry;
use anyhow::Result;

/// List the registered tools.
pub fn run_tools(settings: Settings) -> Result<()> {
    let registry = ToolRegistry::standard(&settings)?;

    Output::header(&format!("Analysis Tools ({})", registry.len()));
    println!();
    for spec in registry.specs(None) {
        Output::tool(spec.name, spec.description);
    }
    println!();
    Output::info("Run one with: agency tool <name> --input '{\"key\": \"value\"}'");

    Ok(())
}

/// Run a single tool and print its result record.
pub async fn run_tool(name: &str, input: Option<&str>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Tool, &settings)?;
    let registry = ToolRegistry::standard(&settings)?;

    if !registry.contains(name) {
        Output::error(&format!("Unknown tool: {}", name));
        Output::info(&format!("Available tools: {}", registry.names().join(", ")));
        anyhow::bail!("Unknown tool: {}", name);
    }

    let spinner = Output::spinner(&format!("Running {}...", name));
    let result = registry.run_raw(name, input.unwrap_or("{}")).await;
    spinner.finish_and_clear();

    println!("{}", result.to_json_string());
    if !result.is_success() {
        anyhow::bail!("Tool {} reported an error", name);
    }
    Ok(())
}
