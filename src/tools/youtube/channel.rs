use super::recent_uploads;
use crate::clients::YouTubeClient;
use crate::error::{AgencyError, Result};
use crate::tools::metrics::{average, engagement_rate, upload_frequency};
use crate::tools::{parse_args, AnalysisTool};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

const RECENT_VIDEOS: u32 = 10;

#[derive(Debug, Deserialize)]
struct Args {
    channel_id: String,
}

/// Channel statistics and the performance of its latest uploads.
pub struct ChannelAnalyzer {
    client: Arc<YouTubeClient>,
}

impl ChannelAnalyzer {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisTool for ChannelAnalyzer {
    fn name(&self) -> &'static str {
        "channel_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze a YouTube channel's statistics, recent uploads and content strategy."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel_id": { "type": "string", "description": "The YouTube channel ID to analyze" }
            },
            "required": ["channel_id"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;
        info!("Analyzing channel {}", args.channel_id);

        let channel = self
            .client
            .channel(&args.channel_id, "statistics,snippet,contentDetails")
            .await?
            .ok_or_else(|| AgencyError::NotFound(format!("Channel not found: {}", args.channel_id)))?;

        let uploads = recent_uploads(&self.client, &channel, RECENT_VIDEOS, "statistics").await?;

        let views: Vec<u64> = uploads.iter().map(|u| u.video.statistics.views()).collect();
        let likes: u64 = uploads.iter().map(|u| u.video.statistics.likes()).sum();
        let comments: u64 = uploads.iter().map(|u| u.video.statistics.comments()).sum();
        let published: Vec<&str> = uploads
            .iter()
            .map(|u| u.item.snippet.published_at.as_str())
            .collect();

        let recent_videos: Vec<Value> = uploads
            .iter()
            .map(|u| {
                json!({
                    "video_id": u.video.id,
                    "title": u.item.snippet.title,
                    "published_at": u.item.snippet.published_at,
                    "views": u.video.statistics.views(),
                    "likes": u.video.statistics.likes(),
                    "comments": u.video.statistics.comments(),
                })
            })
            .collect();

        info!(
            "Analyzed channel {} with {} recent videos",
            args.channel_id,
            recent_videos.len()
        );

        Ok(json!({
            "channel_info": {
                "id": channel.id,
                "title": channel.snippet.title,
                "description": channel.snippet.description,
                "subscriber_count": channel.statistics.subscribers(),
                "video_count": channel.statistics.videos(),
                "view_count": channel.statistics.views(),
            },
            "recent_videos": recent_videos,
            "content_strategy": {
                "upload_frequency": upload_frequency(&published),
                "average_views": average(&views),
                "engagement_rate": engagement_rate(likes, comments, views.iter().sum()),
            },
        }))
    }
}
