//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting work
//! that would otherwise fail on the first upstream call.

use crate::config::Settings;
use crate::error::{AgencyError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Agent conversations need an OpenAI key.
    Agency,
    /// Video generation needs a Google AI key.
    Video,
    /// Tools check their own keys and degrade to error records.
    Tool,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Agency => check_openai_key(),
        Operation::Video => settings.google_api_key().map(|_| ()).ok_or_else(|| {
            AgencyError::Config(
                "GOOGLE_API_KEY not set. Set it with: export GOOGLE_API_KEY='...' or google.api_key in the config file".to_string(),
            )
        }),
        Operation::Tool => Ok(()),
    }
}

/// Check if the OpenAI API key is configured.
fn check_openai_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(AgencyError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(AgencyError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Keys that are missing, for a startup warning.
pub fn missing_data_keys(settings: &Settings) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if settings.youtube_api_key().is_none() {
        missing.push("YOUTUBE_API_KEY");
    }
    if settings.tavily_api_key().is_none() {
        missing.push("TAVILY_API_KEY");
    }
    if settings.google_api_key().is_none() {
        missing.push("GOOGLE_API_KEY");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_no_requirements() {
        assert!(check(Operation::Tool, &Settings::default()).is_ok());
    }

    #[test]
    fn test_configured_google_key_passes_video_check() {
        let mut settings = Settings::default();
        settings.google.api_key = Some("configured".to_string());
        assert!(check(Operation::Video, &settings).is_ok());
        assert!(!missing_data_keys(&settings).contains(&"GOOGLE_API_KEY"));
    }
}
