//! YouTube analytics tools.

mod channel;
mod comments;
mod competitors;
mod search;
mod video;

pub use channel::ChannelAnalyzer;
pub use comments::CommentAnalyzer;
pub use competitors::ChannelCompetitorAnalyzer;
pub use search::VideoSearcher;
pub use video::VideoPerformanceAnalyzer;

use crate::clients::{Channel, PlaylistItem, Video, YouTubeClient};
use crate::error::Result;
use std::collections::HashMap;

/// A channel upload joined with its video resource.
struct Upload {
    item: PlaylistItem,
    video: Video,
}

/// Most recent uploads of a channel with the requested video parts.
///
/// Playlist entries whose video can no longer be fetched are dropped.
async fn recent_uploads(
    client: &YouTubeClient,
    channel: &Channel,
    max_results: u32,
    parts: &str,
) -> Result<Vec<Upload>> {
    let Some(playlist_id) = channel.uploads_playlist() else {
        return Ok(Vec::new());
    };
    let items = client.playlist_items(playlist_id, max_results).await?;
    let ids: Vec<String> = items
        .iter()
        .filter_map(|i| i.snippet.resource_id.video_id.clone())
        .collect();

    let mut videos: HashMap<String, Video> = client
        .videos(&ids, parts)
        .await?
        .into_iter()
        .map(|v| (v.id.clone(), v))
        .collect();

    Ok(items
        .into_iter()
        .filter_map(|item| {
            let id = item.snippet.resource_id.video_id.as_deref()?;
            let video = videos.remove(id)?;
            Some(Upload { item, video })
        })
        .collect())
}
