//! Ask command implementation.

use super::build_agency;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Send one prompt to the agency (or one named agent) and print the reply.
pub async fn run_ask(prompt: &str, agent: Option<&str>, settings: Settings) -> Result<()> {
    let (agency, _tools) = build_agency(&settings)?;
    let agent = agent.unwrap_or(agency.chart().entry);

    let spinner = Output::spinner(&format!("{} is working...", agent));
    let result = agency.ask(agent, prompt).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            Output::reply(agent, &response);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to get a response: {}", e));
            let names: Vec<&str> = agency.chart().agents.iter().map(|a| a.name).collect();
            Output::info(&format!("Available agents: {}", names.join(", ")));
            Err(e.into())
        }
    }
}
