//! Configuration module for the agency.
//!
//! Handles loading settings from TOML with defaults and environment fallbacks.

mod settings;

pub use settings::{
    AgencySettings, ApiKeySettings, GeneralSettings, RetrySettings, ServerSettings,
    SessionSettings, Settings, VideoSettings,
};
