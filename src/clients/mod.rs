//! Thin HTTP clients for the third-party data sources the analyzers consume.
//!
//! Every request goes through the retry executor, and non-success responses are
//! turned into errors that carry the status line so rate limiting (429) is
//! recognised by the retry heuristic.

mod tavily;
mod trends;
mod youtube;

pub use tavily::{SearchDepth, TavilyClient, TavilyResponse, TavilyResult};
pub use trends::{RankedQuery, RelatedQueries, TimelinePoint, TrendsClient, Widget};
pub use youtube::{
    Channel, CommentSnippet, CommentThread, ListResponse, PlaylistItem, SearchItem, Statistics,
    Video, YouTubeClient,
};

use crate::error::{AgencyError, Result};
use std::time::Duration;

/// Header carrying the key for Google APIs, kept out of URLs so it never
/// shows up in error messages.
pub(crate) const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default timeout for data API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build the shared reqwest client used by the data API clients.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()?)
}

/// Turn a non-success response into an error built by `wrap`.
pub(crate) async fn check_status(
    response: reqwest::Response,
    wrap: fn(String) -> AgencyError,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(wrap(format!("HTTP {}: {}", status, body.trim())))
}
