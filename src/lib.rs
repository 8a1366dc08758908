//! Content Agency - LLM agents for content research and drafting
//!
//! A content creation agency for AI and technology creators: a content manager
//! agent backed by a trend analyst and a YouTube analyst, served through a chat
//! API and a CLI.
//!
//! # Overview
//!
//! The agency can:
//! - Chat through persistent in-process sessions over HTTP or the terminal
//! - Analyze Google Trends interest and related queries
//! - Research the web and competitor coverage through Tavily
//! - Analyze YouTube channels, videos, comments and competitors
//! - Draft content ideas and save Markdown scripts
//! - Render short videos from scripts with Google Veo
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `retry` - Backoff-retry executor shared by every outbound call
//! - `clients` - YouTube, Trends and Tavily HTTP clients
//! - `tools` - Analysis tools and the tool registry
//! - `agent` - Agent profiles and the OpenAI tool-calling agency
//! - `session` - Chat session store and chat service
//! - `video` - Veo video generation
//! - `api` - HTTP API
//!
//! # Example
//!
//! ```rust,no_run
//! use content_agency::config::Settings;
//! use content_agency::tools::ToolRegistry;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let tools = ToolRegistry::standard(&settings)?;
//!
//!     let result = tools
//!         .run("keyword_extractor", json!({ "text": "rust async runtimes in rust" }))
//!         .await;
//!     println!("{}", result.to_json_string());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod openai;
pub mod retry;
pub mod session;
pub mod text;
pub mod tools;
pub mod video;

pub use error::{AgencyError, Result};
