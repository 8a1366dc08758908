//! Google Trends client.
//!
//! Uses the same two-step flow as the Trends web UI: `explore` hands out one
//! widget (request + token) per data view, then each widget's data is fetched
//! from `widgetdata/*`. Responses are prefixed with an anti-XSSI guard that is
//! stripped before parsing.

use super::{check_status, http_client};
use crate::error::{AgencyError, Result};
use crate::retry::{with_retry, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://trends.google.com/trends/api";
const HOST_LANGUAGE: &str = "en-US";
const TIMEZONE_OFFSET: &str = "360";

/// A data view handed out by the explore endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub request: Value,
}

impl Widget {
    /// Keyword a per-keyword widget (e.g. related queries) belongs to.
    pub fn keyword(&self) -> Option<&str> {
        self.request
            .pointer("/restriction/complexKeywordsRestriction/keyword/0/value")
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

/// One sample of relative search interest (0-100) per compared keyword.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePoint {
    /// Unix seconds, as a string.
    pub time: String,
    #[serde(default)]
    pub value: Vec<i64>,
    #[serde(default)]
    pub is_partial: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineData {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

/// A related search query with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedQuery {
    pub query: String,
    #[serde(default)]
    pub value: Value,
}

/// Top and rising related queries for a keyword.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RelatedQueries {
    pub top: Vec<RankedQuery>,
    pub rising: Vec<RankedQuery>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedList {
    #[serde(default)]
    ranked_keyword: Vec<RankedQuery>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelatedData {
    #[serde(default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    default: T,
}

/// Strip the `)]}'` guard Google prepends to JSON responses.
pub(crate) fn strip_xssi(body: &str) -> &str {
    match body.find(['{', '[']) {
        Some(start) => &body[start..],
        None => body,
    }
}

/// Google Trends client.
pub struct TrendsClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl TrendsClient {
    pub fn new(retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: DEFAULT_BASE_URL.to_string(),
            retry,
        })
    }

    /// Point the client at a different API root (used for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        with_retry(&self.retry, &format!("trends.{}", path), || async {
            let response = self
                .http
                .get(&url)
                .query(&[("hl", HOST_LANGUAGE), ("tz", TIMEZONE_OFFSET)])
                .query(params)
                .send()
                .await?;
            let response = check_status(response, AgencyError::Trends).await?;
            let body = response.text().await?;
            Ok::<T, AgencyError>(serde_json::from_str(strip_xssi(&body))?)
        })
        .await
    }

    /// Request widgets comparing `keywords` over `timeframe` (e.g. `today 12-m`).
    #[instrument(skip(self))]
    pub async fn explore(&self, keywords: &[String], timeframe: &str) -> Result<Vec<Widget>> {
        let comparison: Vec<Value> = keywords
            .iter()
            .map(|kw| json!({ "keyword": kw, "time": timeframe, "geo": "" }))
            .collect();
        let req = json!({
            "comparisonItem": comparison,
            "category": 0,
            "property": "",
        });

        let response: ExploreResponse = self.get("explore", &[("req", req.to_string())]).await?;
        debug!("Trends explore returned {} widgets", response.widgets.len());
        Ok(response.widgets)
    }

    /// Interest-over-time series for a `TIMESERIES` widget.
    #[instrument(skip(self, widget))]
    pub async fn interest_over_time(&self, widget: &Widget) -> Result<Vec<TimelinePoint>> {
        let data: Envelope<TimelineData> = self
            .get("widgetdata/multiline", &widget_params(widget))
            .await?;
        Ok(data.default.timeline_data)
    }

    /// Top and rising queries for a `RELATED_QUERIES` widget.
    #[instrument(skip(self, widget))]
    pub async fn related_queries(&self, widget: &Widget) -> Result<RelatedQueries> {
        let data: Envelope<RelatedData> = self
            .get("widgetdata/relatedsearches", &widget_params(widget))
            .await?;
        let mut lists = data.default.ranked_list.into_iter();
        Ok(RelatedQueries {
            top: lists.next().map(|l| l.ranked_keyword).unwrap_or_default(),
            rising: lists.next().map(|l| l.ranked_keyword).unwrap_or_default(),
        })
    }
}

fn widget_params(widget: &Widget) -> Vec<(&'static str, String)> {
    vec![
        ("req", widget.request.to_string()),
        ("token", widget.token.clone()),
    ]
}
