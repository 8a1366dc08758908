//! Configuration settings for the agency.

use crate::retry::{Jitter, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub agency: AgencySettings,
    pub retry: RetrySettings,
    pub sessions: SessionSettings,
    pub youtube: ApiKeySettings,
    pub tavily: ApiKeySettings,
    pub google: ApiKeySettings,
    pub video: VideoSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (scripts, videos).
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.content-agency".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS on `/api/*`.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Agent orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgencySettings {
    /// Chat completions model used by every agent.
    pub model: String,
    /// Default sampling temperature for agents without their own.
    pub temperature: f32,
    /// Maximum LLM round-trips per agent turn.
    pub max_iterations: usize,
    /// Maximum nesting of agent-to-agent delegation.
    pub max_delegation_depth: usize,
}

impl Default for AgencySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_iterations: 15,
            max_delegation_depth: 3,
        }
    }
}

/// Backoff settings for outbound API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_wait_seconds: f64,
    pub jitter: Jitter,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_wait_seconds: 20.0,
            jitter: Jitter::None,
        }
    }
}

impl RetrySettings {
    /// Build the retry policy described by these settings.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs_f64(self.initial_wait_seconds.max(0.0)),
        )
        .with_jitter(self.jitter)
    }
}

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionSettings {
    /// Maximum live sessions. None keeps every session for the process lifetime.
    pub max_sessions: Option<usize>,
}

/// Settings for a keyed third-party API.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApiKeySettings {
    pub api_key: Option<String>,
}

/// Veo video generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub model: String,
    /// Output directory for downloaded videos (relative paths resolve under data_dir).
    pub output_dir: String,
    pub poll_interval_seconds: u64,
    /// Upper bound on how long to wait for a generation operation.
    pub max_wait_seconds: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            model: "veo-2.0-generate-001".to_string(),
            output_dir: "videos".to_string(),
            poll_interval_seconds: 20,
            max_wait_seconds: 600,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("content-agency")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory the script writer saves Markdown drafts into.
    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir().join("scripts")
    }

    /// Directory generated videos are downloaded into.
    pub fn video_dir(&self) -> PathBuf {
        let dir = Self::expand_path(&self.video.output_dir);
        if dir.is_absolute() {
            dir
        } else {
            self.data_dir().join(dir)
        }
    }

    /// YouTube Data API key from config, falling back to `YOUTUBE_API_KEY`.
    pub fn youtube_api_key(&self) -> Option<String> {
        key_or_env(&self.youtube.api_key, "YOUTUBE_API_KEY")
    }

    /// Tavily API key from config, falling back to `TAVILY_API_KEY`.
    pub fn tavily_api_key(&self) -> Option<String> {
        key_or_env(&self.tavily.api_key, "TAVILY_API_KEY")
    }

    /// Google AI API key from config, falling back to `GOOGLE_API_KEY`.
    pub fn google_api_key(&self) -> Option<String> {
        key_or_env(&self.google.api_key, "GOOGLE_API_KEY")
    }
}

fn key_or_env(configured: &Option<String>, var: &str) -> Option<String> {
    configured
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| std::env::var(var).ok().filter(|k| !k.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retry_contract() {
        let settings = Settings::default();
        let policy = settings.retry.policy();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.initial_wait(), Duration::from_secs(20));
        assert_eq!(policy.jitter(), Jitter::None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 9090

            [retry]
            jitter = "uniform"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.retry.jitter, Jitter::Uniform);
        assert_eq!(settings.retry.max_retries, 3);
        assert!(settings.sessions.max_sessions.is_none());
    }

    #[test]
    fn test_configured_key_wins_over_env() {
        let mut settings = Settings::default();
        settings.tavily.api_key = Some("tvly-configured".to_string());
        assert_eq!(settings.tavily_api_key().as_deref(), Some("tvly-configured"));
    }

    #[test]
    fn test_video_dir_resolves_under_data_dir() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/srv/agency".to_string();
        assert_eq!(settings.video_dir(), PathBuf::from("/srv/agency/videos"));

        settings.video.output_dir = "/tmp/out".to_string();
        assert_eq!(settings.video_dir(), PathBuf::from("/tmp/out"));
    }
}
