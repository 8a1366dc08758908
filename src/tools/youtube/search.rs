use crate::clients::YouTubeClient;
use crate::error::{AgencyError, Result};
use crate::tools::{parse_args, AnalysisTool};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

fn default_max_results() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
struct Args {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: u32,
}

/// Video search with view counts and durations attached.
pub struct VideoSearcher {
    client: Arc<YouTubeClient>,
}

impl VideoSearcher {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self { client }
    }

    async fn describe(&self, video_id: String, title: String, channel: String) -> Option<Value> {
        match self
            .client
            .videos(std::slice::from_ref(&video_id), "statistics,contentDetails")
            .await
        {
            Ok(videos) => {
                let Some(video) = videos.into_iter().next() else {
                    warn!("No details found for video {}", video_id);
                    return None;
                };
                Some(json!({
                    "video_id": video_id,
                    "title": title,
                    "channel": channel,
                    "views": video.statistics.views(),
                    "duration": video.content_details.duration,
                }))
            }
            Err(e) => {
                warn!("Failed to fetch details for video {}: {}", video_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl AnalysisTool for VideoSearcher {
    fn name(&self) -> &'static str {
        "video_searcher"
    }

    fn description(&self) -> &'static str {
        "Search YouTube for videos matching a query and return their IDs, views and durations."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of videos to return",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;
        let items = self
            .client
            .search(&args.query, "video", args.max_results)
            .await?;
        info!("Found {} videos for '{}'", items.len(), args.query);

        let lookups = items.into_iter().filter_map(|item| {
            let video_id = item.id.video_id?;
            Some(self.describe(video_id, item.snippet.title, item.snippet.channel_title))
        });
        let videos: Vec<Value> = join_all(lookups).await.into_iter().flatten().collect();

        if videos.is_empty() {
            return Err(AgencyError::NotFound(
                "No videos could be processed".to_string(),
            ));
        }

        Ok(json!({ "videos": videos }))
    }
}
