//! Tavily web search client.

use super::{check_status, http_client};
use crate::error::{AgencyError, Result};
use crate::retry::{with_retry, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// How much effort Tavily spends per query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    max_results: u32,
    include_answer: bool,
}

/// One web search hit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TavilyResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TavilyResponse {
    pub answer: Option<String>,
    pub results: Vec<TavilyResult>,
}

/// Tavily search API client.
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
}

impl TavilyClient {
    pub fn new(api_key: Option<String>, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry,
        })
    }

    /// Point the client at a different API root (used for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: u32,
        include_answer: bool,
    ) -> Result<TavilyResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AgencyError::Config("Tavily API key not configured".to_string()))?;
        let url = format!("{}/search", self.base_url);
        let body = SearchRequest {
            api_key,
            query,
            search_depth: depth,
            max_results,
            include_answer,
        };

        let response = with_retry(&self.retry, "tavily.search", || async {
            let response = self.http.post(&url).json(&body).send().await?;
            let response = check_status(response, AgencyError::Search).await?;
            Ok::<TavilyResponse, AgencyError>(response.json().await?)
        })
        .await?;

        debug!("Tavily returned {} results", response.results.len());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: TavilyResponse = serde_json::from_str(
            r#"{"results": [{"title": "Rust 2026", "url": "https://example.com", "score": 0.9}]}"#,
        )
        .unwrap();
        assert!(response.answer.is_none());
        assert_eq!(response.results[0].content, "");
        assert!((response.results[0].score - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_search_depth_wire_format() {
        assert_eq!(
            serde_json::to_string(&SearchDepth::Advanced).unwrap(),
            "\"advanced\""
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let client = TavilyClient::new(None, RetryPolicy::new(1, Duration::ZERO)).unwrap();
        let err = client
            .search("rust", SearchDepth::Basic, 5, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AgencyError::Config(_)));
    }
}
