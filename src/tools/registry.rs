//! Explicit name-to-tool table.

use super::{
    AnalysisResult, AnalysisTool, ChannelAnalyzer, ChannelCompetitorAnalyzer, CommentAnalyzer,
    ContentGenerator, KeywordExtractor, ScriptWriter, SentimentAnalyzer, TrendAnalyzer,
    VideoPerformanceAnalyzer, VideoSearcher, WebCompetitorAnalyzer, WebSearch,
};
use crate::clients::{TavilyClient, TrendsClient, YouTubeClient};
use crate::config::Settings;
use crate::error::Result;
use crate::openai::create_client;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Public description of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Registered analysis tools, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, Arc<dyn AnalysisTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard tool set from settings.
    pub fn standard(settings: &Settings) -> Result<Self> {
        let retry = settings.retry.policy();
        let youtube = Arc::new(YouTubeClient::new(settings.youtube_api_key(), retry)?);
        let tavily = Arc::new(TavilyClient::new(settings.tavily_api_key(), retry)?);
        let trends = TrendsClient::new(TrendAnalyzer::default_policy())?;

        let mut registry = Self::new();
        registry
            .register(TrendAnalyzer::new(trends))
            .register(WebCompetitorAnalyzer::new(tavily.clone()))
            .register(WebSearch::new(tavily))
            .register(KeywordExtractor)
            .register(ChannelAnalyzer::new(youtube.clone()))
            .register(VideoPerformanceAnalyzer::new(youtube.clone()))
            .register(CommentAnalyzer::new(youtube.clone()))
            .register(ChannelCompetitorAnalyzer::new(youtube.clone()))
            .register(VideoSearcher::new(youtube))
            .register(ContentGenerator::new(
                create_client()?,
                settings.agency.model.clone(),
                retry,
            ))
            .register(ScriptWriter::new(settings.scripts_dir()))
            .register(SentimentAnalyzer);
        Ok(registry)
    }

    /// Add a tool, replacing any tool registered under the same name.
    pub fn register(&mut self, tool: impl AnalysisTool + 'static) -> &mut Self {
        self.tools.insert(tool.name(), Arc::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AnalysisTool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Specs for the named tools (unknown names are skipped), or all tools.
    pub fn specs(&self, names: Option<&[&str]>) -> Vec<ToolSpec> {
        let spec = |tool: &Arc<dyn AnalysisTool>| ToolSpec {
            name: tool.name(),
            description: tool.description(),
            parameters: tool.parameters(),
        };
        match names {
            Some(names) => names
                .iter()
                .filter_map(|name| self.tools.get(name))
                .map(spec)
                .collect(),
            None => self.tools.values().map(spec).collect(),
        }
    }

    /// Run a tool by name. Never fails: unknown tools and panics become error records.
    pub async fn run(&self, name: &str, input: Value) -> AnalysisResult {
        let Some(tool) = self.get(name) else {
            return AnalysisResult::error(format!("Unknown tool: {}", name));
        };
        debug!("Running tool {} with {}", name, input);

        match AssertUnwindSafe(tool.run(input)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                error!("Tool {} panicked", name);
                AnalysisResult::error(format!("Tool {} failed unexpectedly", name))
            }
        }
    }

    /// Run a tool with raw JSON arguments as sent by the model.
    pub async fn run_raw(&self, name: &str, arguments: &str) -> AnalysisResult {
        let input = if arguments.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_str(arguments) {
                Ok(value) => value,
                Err(e) => {
                    return AnalysisResult::error(format!(
                        "Failed to parse arguments for {}: {}",
                        name, e
                    ))
                }
            }
        };
        self.run(name, input).await
    }
}
