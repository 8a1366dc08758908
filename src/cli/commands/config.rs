//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;

const REDACTED: &str = "********";

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&redacted(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Hide configured API keys.
fn redacted(mut settings: Settings) -> Settings {
    for section in [
        &mut settings.youtube,
        &mut settings.tavily,
        &mut settings.google,
    ] {
        if section.api_key.is_some() {
            section.api_key = Some(REDACTED.to_string());
        }
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_hides_keys() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("AIza-secret".to_string());
        let shown = toml::to_string_pretty(&redacted(settings)).unwrap();
        assert!(!shown.contains("AIza-secret"));
        assert!(shown.contains(REDACTED));
    }
}
