use super::{recent_uploads, Upload};
use crate::clients::{Channel, YouTubeClient};
use crate::error::{AgencyError, Result};
use crate::tools::metrics::{
    average, average_days_between, content_types, market_position, parse_iso_duration,
    parse_timestamps,
};
use crate::tools::{parse_args, AnalysisTool};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

const RECENT_VIDEOS: u32 = 5;

fn default_max_competitors() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
struct Args {
    channel_id: String,
    #[serde(default = "default_max_competitors")]
    max_competitors: u32,
}

/// Content strategy of a channel judged from its latest uploads.
fn content_strategy(uploads: &[Upload]) -> Value {
    if uploads.is_empty() {
        return json!("No recent videos found");
    }
    let durations: Vec<u64> = uploads
        .iter()
        .map(|u| parse_iso_duration(&u.video.content_details.duration))
        .collect();
    let dates = parse_timestamps(uploads.iter().map(|u| u.item.snippet.published_at.as_str()));

    json!({
        "average_video_length": format!("{:.1} minutes", average(&durations) / 60.0),
        "upload_frequency": format!("{:.1} days between uploads", average_days_between(&dates)),
        "content_types": content_types(uploads.iter().map(|u| u.item.snippet.title.as_str())),
    })
}

/// Channels similar to a target and how the target compares.
pub struct ChannelCompetitorAnalyzer {
    client: Arc<YouTubeClient>,
}

impl ChannelCompetitorAnalyzer {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self { client }
    }

    async fn profile(&self, competitor_id: &str) -> Result<Option<(Channel, Value)>> {
        let Some(channel) = self
            .client
            .channel(competitor_id, "snippet,statistics,contentDetails")
            .await?
        else {
            return Ok(None);
        };
        let uploads =
            recent_uploads(&self.client, &channel, RECENT_VIDEOS, "statistics,contentDetails")
                .await?;

        let recent_videos: Vec<Value> = uploads
            .iter()
            .map(|u| {
                json!({
                    "title": u.item.snippet.title,
                    "published_at": u.item.snippet.published_at,
                    "views": u.video.statistics.views(),
                    "likes": u.video.statistics.likes(),
                    "duration": u.video.content_details.duration,
                })
            })
            .collect();

        let profile = json!({
            "channel_info": {
                "id": channel.id,
                "title": channel.snippet.title,
                "description": channel.snippet.description,
                "subscriber_count": channel.statistics.subscribers(),
                "video_count": channel.statistics.videos(),
                "view_count": channel.statistics.views(),
            },
            "recent_videos": recent_videos,
            "content_strategy": content_strategy(&uploads),
        });
        Ok(Some((channel, profile)))
    }
}

#[async_trait]
impl AnalysisTool for ChannelCompetitorAnalyzer {
    fn name(&self) -> &'static str {
        "channel_competitor_analyzer"
    }

    fn description(&self) -> &'static str {
        "Find YouTube channels competing with a target channel and compare their content strategy."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "channel_id": { "type": "string", "description": "The YouTube channel ID to analyze" },
                "max_competitors": {
                    "type": "integer",
                    "description": "Maximum number of competitor channels to analyze",
                    "default": 5
                }
            },
            "required": ["channel_id"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;

        let target = self
            .client
            .channel(&args.channel_id, "snippet,statistics")
            .await?
            .ok_or_else(|| AgencyError::NotFound(format!("Channel not found: {}", args.channel_id)))?;
        info!("Finding competitors for {}", target.snippet.title);

        let candidates = self
            .client
            .search(&target.snippet.title, "channel", args.max_competitors)
            .await?;

        let mut competitors = Vec::new();
        let mut competitor_subscribers = Vec::new();
        for item in candidates {
            let Some(competitor_id) = item.id.channel_id else {
                continue;
            };
            if competitor_id == args.channel_id {
                continue;
            }
            match self.profile(&competitor_id).await {
                Ok(Some((channel, profile))) => {
                    competitor_subscribers.push(channel.statistics.subscribers());
                    competitors.push(profile);
                }
                Ok(None) => {}
                Err(e) => warn!("Skipping competitor {}: {}", competitor_id, e),
            }
        }

        info!("Analyzed {} competitors", competitors.len());
        let target_subscribers = target.statistics.subscribers();

        Ok(json!({
            "target_channel": {
                "id": args.channel_id,
                "title": target.snippet.title,
                "subscriber_count": target_subscribers,
            },
            "competitors": competitors,
            "market_analysis": market_position(target_subscribers, &competitor_subscribers),
        }))
    }
}
