use crate::clients::YouTubeClient;
use crate::error::{AgencyError, Result};
use crate::tools::metrics::{engagement_rate, format_minutes_seconds, like_sentiment, parse_iso_duration};
use crate::tools::{parse_args, AnalysisTool};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Comments sampled for the like-based sentiment bucket.
const SAMPLED_COMMENTS: u32 = 100;

#[derive(Debug, Deserialize)]
struct Args {
    video_id: String,
}

/// Views, engagement, duration and a comment sentiment bucket for one video.
pub struct VideoPerformanceAnalyzer {
    client: Arc<YouTubeClient>,
}

impl VideoPerformanceAnalyzer {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AnalysisTool for VideoPerformanceAnalyzer {
    fn name(&self) -> &'static str {
        "video_performance_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze the performance metrics of a specific YouTube video."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "video_id": { "type": "string", "description": "The ID of the YouTube video to analyze" }
            },
            "required": ["video_id"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;
        info!("Analyzing performance of video {}", args.video_id);

        let video = self
            .client
            .videos(std::slice::from_ref(&args.video_id), "snippet,statistics,contentDetails")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgencyError::NotFound(format!("Video not found: {}", args.video_id)))?;

        let stats = &video.statistics;
        let (views, likes, comments) = (stats.views(), stats.likes(), stats.comments());
        let duration = parse_iso_duration(&video.content_details.duration);

        let (sampled, sentiment) = match self
            .client
            .comment_threads(&args.video_id, SAMPLED_COMMENTS, None, "time")
            .await
        {
            Ok(page) => {
                let likes: Vec<u64> = page.items.iter().map(|t| t.comment().like_count).collect();
                (likes.len(), like_sentiment(&likes))
            }
            Err(e) => {
                warn!("Could not fetch comments for {}: {}", args.video_id, e);
                (0, "Comments unavailable")
            }
        };

        Ok(json!({
            "video_info": {
                "video_id": video.id,
                "title": video.snippet.title,
                "channel": video.snippet.channel_title,
                "performance_metrics": {
                    "views": views,
                    "likes": likes,
                    "comments": comments,
                    "engagement_rate": engagement_rate(likes, comments, views),
                    "duration": format_minutes_seconds(duration),
                },
                "comment_analysis": {
                    "total_comments": sampled,
                    "sentiment": sentiment,
                },
            },
        }))
    }
}
