//! Agent system: the completion seam used by the chat service and the
//! OpenAI-backed agency behind it.
//!
//! The agency is a content manager in front of two analysts (trends and
//! YouTube). Each agent runs a tool-calling loop over its registry tools and
//! may hand work to another agent along the configured communication flows.

mod agency;
mod profile;

pub use agency::Agency;
pub use profile::{
    AgencyChart, AgentProfile, ResponseFrame, AGENCY_MANIFESTO, CONTENT_MANAGER, TREND_ANALYZER,
    YOUTUBE_ANALYZER,
};

use crate::error::Result;
use async_trait::async_trait;

/// Anything that can turn a prompt into a reply.
#[async_trait]
pub trait CompletionAgent: Send + Sync {
    async fn get_completion(&self, prompt: &str) -> Result<String>;
}
