//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod serve;
mod tools;
mod video;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use serve::run_serve;
pub use tools::{run_tool, run_tools};
pub use video::run_video;

use crate::agent::Agency;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::ToolRegistry;
use std::sync::Arc;

/// Check the OpenAI key and build the standard agency over the standard tools.
fn build_agency(settings: &Settings) -> anyhow::Result<(Arc<Agency>, Arc<ToolRegistry>)> {
    if let Err(e) = preflight::check(Operation::Agency, settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }
    for key in preflight::missing_data_keys(settings) {
        Output::warning(&format!(
            "{} not set; tools that need it will report errors",
            key
        ));
    }

    let tools = Arc::new(ToolRegistry::standard(settings)?);
    let agency = Arc::new(Agency::from_settings(settings, tools.clone())?);
    Ok((agency, tools))
}
