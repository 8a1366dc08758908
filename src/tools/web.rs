//! Web search tools backed by Tavily.

use super::{parse_args, AnalysisTool};
use crate::clients::{SearchDepth, TavilyClient, TavilyResult};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Minimum relevance score for a search hit to count as a competitor activity.
const RELEVANCE_THRESHOLD: f64 = 0.5;

/// Pause before the broader fallback query.
const FALLBACK_DELAY: Duration = Duration::from_secs(1);

fn result_json(result: &TavilyResult) -> Value {
    json!({
        "title": result.title,
        "url": result.url,
        "content": result.content,
        "score": result.score,
        "published_date": result.published_date,
    })
}

fn default_depth() -> String {
    "basic".to_string()
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_depth")]
    search_depth: String,
}

/// General web search with a synthesized answer.
pub struct WebSearch {
    client: Arc<TavilyClient>,
}

impl WebSearch {
    pub fn new(client: Arc<TavilyClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisTool for WebSearch {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for the latest news and trends and return a summary answer with sources."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "search_depth": {
                    "type": "string",
                    "enum": ["basic", "advanced"],
                    "default": "basic"
                }
            },
            "required": ["query"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: SearchArgs = parse_args(self.name(), input)?;
        let depth = match args.search_depth.as_str() {
            "advanced" => SearchDepth::Advanced,
            _ => SearchDepth::Basic,
        };

        let response = self.client.search(&args.query, depth, 5, true).await?;
        let results: Vec<Value> = response.results.iter().map(result_json).collect();

        Ok(json!({
            "query": args.query,
            "answer": response.answer,
            "results": results,
        }))
    }
}

fn default_timeframe() -> String {
    "last_month".to_string()
}

#[derive(Debug, Deserialize)]
struct CompetitorArgs {
    competitors: Vec<String>,
    industry_keywords: Vec<String>,
    #[serde(default = "default_timeframe")]
    analysis_timeframe: String,
}

fn timeframe_phrase(timeframe: &str) -> &'static str {
    match timeframe {
        "last_week" => "past 7 days",
        "last_quarter" => "past 90 days",
        _ => "past 30 days",
    }
}

/// Recent web activity of competitors around a set of industry keywords.
pub struct WebCompetitorAnalyzer {
    client: Arc<TavilyClient>,
}

impl WebCompetitorAnalyzer {
    pub fn new(client: Arc<TavilyClient>) -> Self {
        Self { client }
    }

    async fn search_competitor(
        &self,
        competitor: &str,
        keywords: &[String],
        period: &str,
    ) -> Result<Vec<TavilyResult>> {
        let focused = format!(
            "({}) ({}) news announcements updates {}",
            competitor,
            keywords.join(" OR "),
            period
        );
        let response = self
            .client
            .search(&focused, SearchDepth::Advanced, 10, false)
            .await?;
        if !response.results.is_empty() {
            return Ok(response.results);
        }

        debug!("No results for focused query on {}, broadening", competitor);
        tokio::time::sleep(FALLBACK_DELAY).await;
        let broad = format!("{} {} news updates", competitor, period);
        let response = self
            .client
            .search(&broad, SearchDepth::Advanced, 10, false)
            .await?;
        Ok(response.results)
    }
}

/// Activities, keyword presence and a short summary for one competitor's hits.
fn competitor_insight(results: &[TavilyResult], keywords: &[String]) -> Map<String, Value> {
    let mut insight = Map::new();
    if results.is_empty() {
        insight.insert("recent_activities".to_string(), json!([]));
        insight.insert(
            "search_status".to_string(),
            json!("No relevant results found"),
        );
        return insight;
    }

    let activities: Vec<Value> = results
        .iter()
        .filter(|r| r.score > RELEVANCE_THRESHOLD)
        .map(|r| {
            json!({
                "title": r.title,
                "snippet": r.content,
                "url": r.url,
                "date": r.published_date.clone().unwrap_or_default(),
                "relevance_score": r.score,
            })
        })
        .collect();

    let mut presence: Vec<(&str, usize)> = keywords
        .iter()
        .map(|keyword| {
            let needle = keyword.to_lowercase();
            let count = results
                .iter()
                .filter(|r| {
                    r.title.to_lowercase().contains(&needle)
                        || r.content.to_lowercase().contains(&needle)
                })
                .count();
            (keyword.as_str(), count)
        })
        .collect();
    let presence_map: Map<String, Value> = presence
        .iter()
        .map(|(k, c)| (k.to_string(), json!(c)))
        .collect();

    presence.sort_by(|a, b| b.1.cmp(&a.1));
    let most_mentioned: Vec<Value> = presence
        .iter()
        .take(3)
        .map(|(k, c)| json!([k, c]))
        .collect();

    insight.insert(
        "content_analysis".to_string(),
        json!({
            "total_results_found": results.len(),
            "relevant_activities": activities.len(),
            "most_mentioned_keywords": most_mentioned,
        }),
    );
    insight.insert("keyword_presence".to_string(), Value::Object(presence_map));
    insight.insert("recent_activities".to_string(), Value::Array(activities));
    insight
}

#[async_trait]
impl AnalysisTool for WebCompetitorAnalyzer {
    fn name(&self) -> &'static str {
        "web_competitor_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze competitors' recent web presence and announcements around industry keywords."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "competitors": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Competitor names or websites"
                },
                "industry_keywords": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Industry-specific keywords to track"
                },
                "analysis_timeframe": {
                    "type": "string",
                    "enum": ["last_week", "last_month", "last_quarter"],
                    "default": "last_month"
                }
            },
            "required": ["competitors", "industry_keywords"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: CompetitorArgs = parse_args(self.name(), input)?;
        let period = timeframe_phrase(&args.analysis_timeframe);
        info!(
            "Analyzing {} competitors over the {}",
            args.competitors.len(),
            period
        );

        let mut insights = Map::new();
        let mut with_data = 0;
        let mut total_activities = 0;

        for competitor in &args.competitors {
            let insight = match self
                .search_competitor(competitor, &args.industry_keywords, period)
                .await
            {
                Ok(results) => competitor_insight(&results, &args.industry_keywords),
                Err(e) => {
                    warn!("Search for competitor {} failed: {}", competitor, e);
                    let mut failed = Map::new();
                    failed.insert("recent_activities".to_string(), json!([]));
                    failed.insert("search_error".to_string(), json!(e.to_string()));
                    failed
                }
            };

            let activities = insight
                .get("recent_activities")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            if activities > 0 {
                with_data += 1;
            }
            total_activities += activities;
            insights.insert(competitor.clone(), Value::Object(insight));
        }

        Ok(json!({
            "competitors_analyzed": args.competitors,
            "analysis_timeframe": args.analysis_timeframe,
            "competitor_insights": insights,
            "summary": {
                "total_competitors_analyzed": args.competitors.len(),
                "competitors_with_data": with_data,
                "total_activities_found": total_activities,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn search(Json(body): Json<Value>) -> std::result::Result<Json<Value>, StatusCode> {
        let query = body["query"].as_str().unwrap_or_default();
        if query.contains("Broken") {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
        Ok(Json(json!({
            "answer": "Rust is popular",
            "results": [
                {
                    "title": "Acme ships new LLM",
                    "url": "https://acme.example/llm",
                    "content": "Acme announced a large language model for AI safety research",
                    "score": 0.92,
                    "published_date": "2024-05-01"
                },
                {
                    "title": "Unrelated post",
                    "url": "https://acme.example/misc",
                    "content": "Company picnic photos",
                    "score": 0.2
                }
            ]
        })))
    }

    async fn mock_client() -> Arc<TavilyClient> {
        let app = Router::new().route("/search", post(search));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Arc::new(
            TavilyClient::new(Some("tvly-test".to_string()), RetryPolicy::new(1, Duration::ZERO))
                .unwrap()
                .with_base_url(format!("http://{}", addr)),
        )
    }

    #[test]
    fn test_timeframe_phrases() {
        assert_eq!(timeframe_phrase("last_week"), "past 7 days");
        assert_eq!(timeframe_phrase("last_quarter"), "past 90 days");
        assert_eq!(timeframe_phrase("whenever"), "past 30 days");
    }

    #[tokio::test]
    async fn test_competitor_failure_does_not_abort_others() {
        let tool = WebCompetitorAnalyzer::new(mock_client().await);
        let result = tool
            .run(json!({
                "competitors": ["Acme", "Broken"],
                "industry_keywords": ["large language model", "AI safety", "robotics"]
            }))
            .await
            .to_value();

        assert_eq!(result["status"], "success");
        let acme = &result["competitor_insights"]["Acme"];
        assert_eq!(acme["recent_activities"].as_array().unwrap().len(), 1);
        assert_eq!(acme["keyword_presence"]["robotics"], 0);
        assert_eq!(acme["keyword_presence"]["AI safety"], 1);
        assert_eq!(acme["content_analysis"]["total_results_found"], 2);

        let broken = &result["competitor_insights"]["Broken"];
        assert!(broken["search_error"].as_str().unwrap().contains("500"));

        assert_eq!(result["summary"]["competitors_with_data"], 1);
        assert_eq!(result["summary"]["total_activities_found"], 1);
    }

    #[tokio::test]
    async fn test_web_search_returns_answer() {
        let tool = WebSearch::new(mock_client().await);
        let result = tool
            .run(json!({ "query": "rust trends", "search_depth": "comprehensive" }))
            .await
            .to_value();
        assert_eq!(result["answer"], "Rust is popular");
        assert_eq!(result["results"][0]["url"], "https://acme.example/llm");
    }
}
