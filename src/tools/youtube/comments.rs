use crate::clients::YouTubeClient;
use crate::error::{AgencyError, Result};
use crate::tools::metrics::{
    comment_engagement, comment_sentiment, comment_timeline, comment_topics, CommentRecord,
};
use crate::tools::{parse_args, AnalysisTool};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Page size cap of the commentThreads endpoint.
const PAGE_LIMIT: usize = 100;

fn default_max_comments() -> usize {
    100
}

#[derive(Debug, Deserialize)]
struct Args {
    video_id: String,
    #[serde(default = "default_max_comments")]
    max_comments: usize,
}

/// Engagement, sentiment, topics and timing of a video's comments.
pub struct CommentAnalyzer {
    client: Arc<YouTubeClient>,
}

impl CommentAnalyzer {
    pub fn new(client: Arc<YouTubeClient>) -> Self {
        Self { client }
    }

    async fn collect(&self, video_id: &str, max_comments: usize) -> Result<Vec<CommentRecord>> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < max_comments {
            let want = (max_comments - comments.len()).min(PAGE_LIMIT) as u32;
            let page = self
                .client
                .comment_threads(video_id, want, page_token.as_deref(), "relevance")
                .await?;

            comments.extend(page.items.iter().map(|thread| {
                let c = thread.comment();
                CommentRecord {
                    text: c.text_display.clone(),
                    author: c.author_display_name.clone(),
                    likes: c.like_count,
                    published_at: c.published_at.clone(),
                    updated_at: c.updated_at.clone(),
                }
            }));
            debug!("Collected {} comments for {}", comments.len(), video_id);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        comments.truncate(max_comments);
        Ok(comments)
    }
}

#[async_trait]
impl AnalysisTool for CommentAnalyzer {
    fn name(&self) -> &'static str {
        "comment_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze YouTube video comments for engagement, sentiment, common topics and activity over time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "video_id": { "type": "string", "description": "The YouTube video ID to analyze" },
                "max_comments": {
                    "type": "integer",
                    "description": "Maximum number of comments to analyze",
                    "default": 100
                }
            },
            "required": ["video_id"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;

        let video = self
            .client
            .videos(std::slice::from_ref(&args.video_id), "snippet,statistics")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AgencyError::NotFound(format!("Video not found: {}", args.video_id)))?;
        info!("Analyzing comments for: {}", video.snippet.title);

        let comments = self.collect(&args.video_id, args.max_comments).await?;

        let mut top = comments.clone();
        top.sort_by(|a, b| b.likes.cmp(&a.likes));
        top.truncate(5);

        Ok(json!({
            "video_info": {
                "title": video.snippet.title,
                "view_count": video.statistics.views(),
                "like_count": video.statistics.likes(),
                "comment_count": video.statistics.comments(),
            },
            "comment_analysis": {
                "total_comments_analyzed": comments.len(),
                "engagement_metrics": comment_engagement(&comments),
                "sentiment_analysis": comment_sentiment(&comments),
                "common_topics": comment_topics(&comments),
                "top_comments": top,
                "comment_timeline": comment_timeline(&comments),
            },
        }))
    }
}
