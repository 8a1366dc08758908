//! Google Trends keyword analysis.

use super::{parse_args, AnalysisTool};
use crate::clients::{RelatedQueries, TimelinePoint, TrendsClient, Widget};
use crate::error::{AgencyError, Result};
use crate::retry::{Jitter, RetryPolicy};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Google Trends compares at most five terms per request.
const MAX_KEYWORDS: usize = 5;

const TIMESERIES_WIDGET: &str = "TIMESERIES";
const RELATED_QUERIES_WIDGET: &str = "RELATED_QUERIES";

fn default_timeframe() -> String {
    "today 12-m".to_string()
}

#[derive(Debug, Deserialize)]
struct Args {
    keywords: Vec<String>,
    #[serde(default = "default_timeframe")]
    timeframe: String,
}

/// Relative search interest and related queries for up to five keywords.
pub struct TrendAnalyzer {
    client: TrendsClient,
}

impl TrendAnalyzer {
    /// Trends throttles aggressively, so this tool backs off from one second
    /// with jitter rather than using the agency-wide policy.
    pub fn default_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1)).with_jitter(Jitter::Uniform)
    }

    pub fn new(client: TrendsClient) -> Self {
        Self { client }
    }
}

/// Per-keyword `YYYY-MM-DD -> interest` maps.
fn interest_by_keyword(keywords: &[String], points: &[TimelinePoint]) -> Map<String, Value> {
    let mut by_keyword = Map::new();
    for (index, keyword) in keywords.iter().enumerate() {
        let mut series = Map::new();
        for point in points {
            let Some(date) = point
                .time
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
            else {
                continue;
            };
            if let Some(value) = point.value.get(index) {
                series.insert(date.format("%Y-%m-%d").to_string(), json!(value));
            }
        }
        by_keyword.insert(keyword.clone(), Value::Object(series));
    }
    by_keyword
}

impl TrendAnalyzer {
    async fn related_for(&self, widgets: &[Widget], keyword: &str) -> RelatedQueries {
        let Some(widget) = widgets
            .iter()
            .find(|w| w.id.starts_with(RELATED_QUERIES_WIDGET) && w.keyword() == Some(keyword))
        else {
            return RelatedQueries::default();
        };
        match self.client.related_queries(widget).await {
            Ok(related) => related,
            Err(e) => {
                warn!("Could not get related queries for '{}': {}", keyword, e);
                RelatedQueries::default()
            }
        }
    }
}

#[async_trait]
impl AnalysisTool for TrendAnalyzer {
    fn name(&self) -> &'static str {
        "trend_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze Google Trends search interest over time and related queries for up to five keywords."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Keywords to analyze (at most five are used)"
                },
                "timeframe": {
                    "type": "string",
                    "description": "Time period, e.g. 'today 3-m', 'today 12-m', '2023-01-01 2024-01-01'",
                    "default": "today 12-m"
                }
            },
            "required": ["keywords"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;
        let keywords: Vec<String> = args
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect();
        if keywords.is_empty() {
            return Err(AgencyError::InvalidInput(
                "No keywords provided for analysis".to_string(),
            ));
        }

        info!("Analyzing trends for {:?} over '{}'", keywords, args.timeframe);
        let widgets = self.client.explore(&keywords, &args.timeframe).await?;

        let points = match widgets.iter().find(|w| w.id == TIMESERIES_WIDGET) {
            Some(widget) => self
                .client
                .interest_over_time(widget)
                .await
                .unwrap_or_else(|e| {
                    warn!("Could not get interest over time data: {}", e);
                    Vec::new()
                }),
            None => Vec::new(),
        };

        let mut related = Map::new();
        for keyword in &keywords {
            let queries = self.related_for(&widgets, keyword).await;
            related.insert(keyword.clone(), serde_json::to_value(queries)?);
        }

        Ok(json!({
            "interest_over_time": interest_by_keyword(&keywords, &points),
            "related_queries": related,
            "analyzed_keywords": keywords,
            "note": "Data shows relative search interest (0-100) over the specified timeframe.",
        }))
    }
}
