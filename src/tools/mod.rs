//! Analysis tools exposed to the agents and the HTTP API.
//!
//! Every tool implements [`AnalysisTool`]. `analyze` is the fallible body;
//! `run` is the boundary callers use and never fails: errors become an
//! [`AnalysisResult::Error`] record so one broken data source cannot abort a
//! multi-source analysis.

mod content;
mod keywords;
pub mod metrics;
mod registry;
mod sentiment;
mod trends;
mod web;
mod youtube;

pub use content::{ContentGenerator, ScriptWriter};
pub use keywords::{extract_keywords, KeywordExtractor};
pub use registry::{ToolRegistry, ToolSpec};
pub use sentiment::{assessment, score_text, Sentiment, SentimentAnalyzer};
pub use trends::TrendAnalyzer;
pub use web::{WebCompetitorAnalyzer, WebSearch};
pub use youtube::{
    ChannelAnalyzer, ChannelCompetitorAnalyzer, CommentAnalyzer, VideoPerformanceAnalyzer,
    VideoSearcher,
};

use crate::error::{AgencyError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// Uniform outcome of a tool run.
///
/// Serializes flat: `{"status": "success", "timestamp": ..., <payload fields>}`
/// or `{"status": "error", "timestamp": ..., "error": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Success {
        timestamp: DateTime<Utc>,
        data: Map<String, Value>,
    },
    Error {
        timestamp: DateTime<Utc>,
        error: String,
    },
}

impl AnalysisResult {
    /// Wrap a payload. Non-object payloads are placed under `result`.
    pub fn success(payload: Value) -> Self {
        let data = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                map
            }
        };
        Self::Success {
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            timestamp: Utc::now(),
            error: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } | Self::Error { timestamp, .. } => *timestamp,
        }
    }

    /// Flat JSON form. `status` and `timestamp` always win over payload keys.
    pub fn to_value(&self) -> Value {
        let mut map = match self {
            Self::Success { data, .. } => data.clone(),
            Self::Error { error, .. } => {
                let mut map = Map::new();
                map.insert("error".to_string(), Value::String(error.clone()));
                map
            }
        };
        let status = if self.is_success() { "success" } else { "error" };
        map.insert("status".to_string(), Value::String(status.to_string()));
        map.insert(
            "timestamp".to_string(),
            Value::String(self.timestamp().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        Value::Object(map)
    }

    /// Pretty JSON string, as handed back to the model.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| self.to_value().to_string())
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// A single analysis capability.
#[async_trait]
pub trait AnalysisTool: Send + Sync {
    /// Function name the model calls the tool by.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Perform the analysis.
    async fn analyze(&self, input: Value) -> Result<Value>;

    /// Perform the analysis, degrading any failure to an error record.
    async fn run(&self, input: Value) -> AnalysisResult {
        match self.analyze(input).await {
            Ok(payload) => AnalysisResult::success(payload),
            Err(e) => {
                warn!("Tool {} failed: {}", self.name(), e);
                AnalysisResult::error(e.to_string())
            }
        }
    }
}

/// Deserialize tool arguments, reporting schema mismatches as invalid input.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T> {
    // Models sometimes send `null` for tools without required arguments.
    let input = if input.is_null() {
        Value::Object(Map::new())
    } else {
        input
    };
    serde_json::from_value(input)
        .map_err(|e| AgencyError::InvalidInput(format!("Invalid arguments for {}: {}", tool, e)))
}
