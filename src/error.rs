//! Error types for the agency.

use thiserror::Error;

/// Library-level error type for agency operations.
#[derive(Error, Debug)]
pub enum AgencyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("YouTube API error: {0}")]
    YouTube(String),

    #[error("Google Trends error: {0}")]
    Trends(String),

    #[error("Search API error: {0}")]
    Search(String),

    #[error("Video generation failed: {0}")]
    Video(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for AgencyError {
    /// Request URLs may carry credentials, so they are dropped from the error.
    fn from(err: reqwest::Error) -> Self {
        AgencyError::Http(err.without_url())
    }
}

/// Result type alias for agency operations.
pub type Result<T> = std::result::Result<T, AgencyError>;
