//! YouTube Data API v3 client.

use super::{check_status, http_client, API_KEY_HEADER};
use crate::error::{AgencyError, Result};
use crate::retry::{with_retry, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Paged list envelope shared by every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Counters reported for channels and videos. YouTube sends them as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

fn count(value: &Option<String>) -> u64 {
    value
        .as_deref()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

impl Statistics {
    pub fn subscribers(&self) -> u64 {
        count(&self.subscriber_count)
    }

    pub fn videos(&self) -> u64 {
        count(&self.video_count)
    }

    pub fn views(&self) -> u64 {
        count(&self.view_count)
    }

    pub fn likes(&self) -> u64 {
        count(&self.like_count)
    }

    pub fn comments(&self) -> u64 {
        count(&self.comment_count)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelSnippet {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub snippet: ChannelSnippet,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub content_details: ChannelContentDetails,
}

impl Channel {
    /// Id of the channel's uploads playlist, if reported.
    pub fn uploads_playlist(&self) -> Option<&str> {
        self.content_details.related_playlists.uploads.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceId {
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistItemSnippet {
    pub title: String,
    pub published_at: String,
    pub resource_id: ResourceId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSnippet {
    pub title: String,
    pub channel_title: String,
    pub published_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoContentDetails {
    /// ISO-8601 duration, e.g. `PT4M13S`.
    pub duration: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentSnippet {
    pub text_display: String,
    pub author_display_name: String,
    pub like_count: u64,
    pub published_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentThread {
    #[serde(default)]
    pub snippet: CommentThreadSnippet,
}

impl CommentThread {
    pub fn comment(&self) -> &CommentSnippet {
        &self.snippet.top_level_comment.snippet
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchId {
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSnippet {
    pub title: String,
    pub channel_title: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchId,
    #[serde(default)]
    pub snippet: SearchSnippet,
}

/// YouTube Data API client.
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryPolicy,
}

impl YouTubeClient {
    /// Create a client. Requests fail with a configuration error when no key is set.
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

    async fn get<T: DeserializeOwned>(&self, resource: &str, params: &[(&str, String)]) -> Result<T> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AgencyError::Config("YouTube API key not configured".to_string()))?;
        let url = format!("{}/{}", self.base_url, resource);

        debug!("YouTube GET {} {:?}", resource, params);

        with_retry(&self.retry, &format!("youtube.{}", resource), || async {
            let response = self
                .http
                .get(&url)
                .query(params)
                .header(API_KEY_HEADER, key)
                .send()
                .await?;
            let response = check_status(response, AgencyError::YouTube).await?;
            Ok::<T, AgencyError>(response.json::<T>().await?)
        })
        .await
    }

    /// Fetch a single channel. `None` when the id matches nothing.
    #[instrument(skip(self))]
    pub async fn channel(&self, channel_id: &str, parts: &str) -> Result<Option<Channel>> {
        let response: ListResponse<Channel> = self
            .get(
                "channels",
                &[("part", parts.to_string()), ("id", channel_id.to_string())],
            )
            .await?;
        Ok(response.items.into_iter().next())
    }

    /// Most recent entries of a playlist (newest first, as YouTube orders uploads).
    #[instrument(skip(self))]
    pub async fn playlist_items(&self, playlist_id: &str, max_results: u32) -> Result<Vec<PlaylistItem>> {
        let response: ListResponse<PlaylistItem> = self
            .get(
                "playlistItems",
                &[
                    ("part", "snippet".to_string()),
                    ("playlistId", playlist_id.to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }

    /// Fetch videos by id in one batched call.
    #[instrument(skip(self, video_ids), fields(count = video_ids.len()))]
    pub async fn videos(&self, video_ids: &[String], parts: &str) -> Result<Vec<Video>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let response: ListResponse<Video> = self
            .get(
                "videos",
                &[("part", parts.to_string()), ("id", video_ids.join(","))],
            )
            .await?;
        Ok(response.items)
    }

    /// One page of top-level comment threads.
    #[instrument(skip(self, page_token))]
    pub async fn comment_threads(
        &self,
        video_id: &str,
        max_results: u32,
        page_token: Option<&str>,
        order: &str,
    ) -> Result<ListResponse<CommentThread>> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", max_results.to_string()),
            ("order", order.to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.get("commentThreads", &params).await
    }

    /// Search for videos or channels (`kind` is `video` or `channel`).
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, kind: &str, max_results: u32) -> Result<Vec<SearchItem>> {
        let response: ListResponse<SearchItem> = self
            .get(
                "search",
                &[
                    ("part", "snippet".to_string()),
                    ("q", query.to_string()),
                    ("type", kind.to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }
}
