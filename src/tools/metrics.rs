//! Pure aggregation helpers shared by the YouTube analyzers.
//!
//! Every ratio guards its denominator: an empty or zero-view input yields 0
//! (or a descriptive string where the payload reports one) instead of NaN.

use chrono::{DateTime, Timelike, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Payload text used when an aggregate has nothing to work on.
pub const NO_COMMENTS: &str = "No comments found";

const POSITIVE_WORDS: &[&str] = &[
    "great", "awesome", "amazing", "love", "thanks", "thank", "helpful", "good",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "wrong", "terrible", "waste", "boring", "confusing",
];
const TOPIC_STOP_WORDS: &[&str] = &[
    "the", "and", "a", "to", "of", "in", "is", "that", "it", "on", "you", "for", "with", "as",
    "at",
];

/// `(likes + comments) / views * 100`, or 0 when there are no views.
pub fn engagement_rate(likes: u64, comments: u64, views: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    (likes + comments) as f64 / views as f64 * 100.0
}

/// Arithmetic mean, 0 for an empty slice.
pub fn average(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64
}

/// Seconds in an ISO-8601 `PT#H#M#S` duration. Unparseable or overflowing
/// input is 0.
pub fn parse_iso_duration(duration: &str) -> u64 {
    static ISO: OnceLock<Regex> = OnceLock::new();
    let re = ISO.get_or_init(|| {
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").expect("Invalid regex")
    });

    let Some(caps) = re.captures(duration) else {
        return 0;
    };
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    part(1)
        .checked_mul(3600)
        .and_then(|secs| secs.checked_add(part(2).checked_mul(60)?))
        .and_then(|secs| secs.checked_add(part(3)))
        .unwrap_or(0)
}

/// `Xm Ys` rendering of a duration in seconds.
pub fn format_minutes_seconds(total_seconds: u64) -> String {
    format!("{}m {}s", total_seconds / 60, total_seconds % 60)
}

/// Parse YouTube's RFC 3339 timestamps, skipping malformed ones.
pub fn parse_timestamps<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<DateTime<Utc>> {
    values
        .into_iter()
        .filter_map(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .collect()
}

/// Whole days between the oldest and newest date, spread over the gaps.
pub fn average_days_between(dates: &[DateTime<Utc>]) -> f64 {
    if dates.len() < 2 {
        return 0.0;
    }
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return 0.0;
    };
    (*last - *first).num_days() as f64 / (dates.len() - 1) as f64
}

/// Human-readable upload cadence for a set of publish timestamps.
pub fn upload_frequency(published: &[&str]) -> String {
    if published.is_empty() {
        return "No videos found".to_string();
    }
    let dates = parse_timestamps(published.iter().copied());
    format!("{:.1} days between uploads", average_days_between(&dates))
}

/// Content categories suggested by video titles.
pub fn content_types<'a>(titles: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut types = BTreeSet::new();
    for title in titles {
        let title = title.to_lowercase();
        if title.contains("tutorial") || title.contains("how to") {
            types.insert("tutorials");
        }
        if title.contains("review") {
            types.insert("reviews");
        }
        if title.contains("news") || title.contains("update") {
            types.insert("news");
        }
        if title.contains("vlog") || title.contains("day in the life") {
            types.insert("vlogs");
        }
    }
    if types.is_empty() {
        return vec!["general content".to_string()];
    }
    types.into_iter().map(str::to_string).collect()
}

/// Sentiment bucket from the average like count of a video's comments.
pub fn like_sentiment(comment_likes: &[u64]) -> &'static str {
    if comment_likes.is_empty() {
        return "No comments available";
    }
    let avg = average(comment_likes);
    if avg > 10.0 {
        "Very positive"
    } else if avg > 5.0 {
        "Positive"
    } else if avg > 2.0 {
        "Neutral"
    } else {
        "Mixed"
    }
}

/// Count occurrences, ordered by frequency then by first appearance.
pub fn rank_by_frequency<I, S>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, item) in items.into_iter().enumerate() {
        counts
            .entry(item.into())
            .and_modify(|(count, _)| *count += 1)
            .or_insert((1, position));
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
    ranked
        .into_iter()
        .map(|(item, (count, _))| (item, count))
        .collect()
}

/// A top-level comment as analyzed.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRecord {
    pub text: String,
    pub author: String,
    pub likes: u64,
    pub published_at: String,
    pub updated_at: String,
}

/// Like totals and per-comment averages.
pub fn comment_engagement(comments: &[CommentRecord]) -> Value {
    if comments.is_empty() {
        return json!(NO_COMMENTS);
    }
    let total_likes: u64 = comments.iter().map(|c| c.likes).sum();
    let avg = total_likes as f64 / comments.len() as f64;
    json!({
        "total_likes": total_likes,
        "average_likes_per_comment": format!("{:.1}", avg),
        "engagement_rate": format!("{:.1} likes per comment", avg),
    })
}

fn comment_score(comment: &CommentRecord) -> f64 {
    let text = comment.text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
    let negative = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
    positive - negative + (comment.likes as f64 / 10.0).min(2.0)
}

/// Keyword and like based sentiment score with its distribution.
pub fn comment_sentiment(comments: &[CommentRecord]) -> Value {
    if comments.is_empty() {
        return json!(NO_COMMENTS);
    }
    let scores: Vec<f64> = comments.iter().map(comment_score).collect();
    let avg = scores.iter().sum::<f64>() / scores.len() as f64;

    let overall = if avg > 1.0 {
        "Very Positive"
    } else if avg > 0.0 {
        "Positive"
    } else if avg > -1.0 {
        "Neutral"
    } else {
        "Negative"
    };
    let count = |pred: fn(f64) -> bool| scores.iter().filter(|&&s| pred(s)).count();

    json!({
        "overall_sentiment": overall,
        "average_sentiment_score": format!("{:.1}", avg),
        "sentiment_distribution": {
            "very_positive": count(|s| s > 1.0),
            "positive": count(|s| s > 0.0 && s <= 1.0),
            "neutral": count(|s| (-1.0..=0.0).contains(&s)),
            "negative": count(|s| s < -1.0),
        },
    })
}

/// Most frequent whitespace-separated words across comments.
pub fn comment_topics(comments: &[CommentRecord]) -> Value {
    if comments.is_empty() {
        return json!(NO_COMMENTS);
    }
    let words: Vec<String> = comments
        .iter()
        .flat_map(|c| {
            c.text
                .to_lowercase()
                .split_whitespace()
                .filter(|w| !TOPIC_STOP_WORDS.contains(w))
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    let unique = words.iter().collect::<BTreeSet<_>>().len();
    let top: Vec<Value> = rank_by_frequency(words)
        .into_iter()
        .take(10)
        .map(|(word, count)| json!({ "word": word, "count": count }))
        .collect();

    json!({ "top_topics": top, "total_unique_words": unique })
}

/// First/last comment time and activity per hour of day (UTC).
pub fn comment_timeline(comments: &[CommentRecord]) -> Value {
    if comments.is_empty() {
        return json!(NO_COMMENTS);
    }
    let mut published: Vec<&str> = comments.iter().map(|c| c.published_at.as_str()).collect();
    published.sort_unstable();

    // (hour, count) in order of first appearance so ties resolve to the earliest.
    let mut hourly: Vec<(u32, usize)> = Vec::new();
    for date in parse_timestamps(published.iter().copied()) {
        let hour = date.hour();
        match hourly.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, count)) => *count += 1,
            None => hourly.push((hour, 1)),
        }
    }

    let mut peak: Option<(u32, usize)> = None;
    for &(hour, count) in &hourly {
        if peak.map_or(true, |(_, best)| count > best) {
            peak = Some((hour, count));
        }
    }

    let distribution: Map<String, Value> = hourly
        .iter()
        .map(|(hour, count)| (hour.to_string(), json!(count)))
        .collect();

    json!({
        "total_comments": comments.len(),
        "first_comment": published.first(),
        "last_comment": published.last(),
        "hourly_distribution": distribution,
        "peak_hour": peak.map(|(hour, _)| hour),
    })
}

/// Target channel's standing against the average competitor.
pub fn market_position(target_subscribers: u64, competitor_subscribers: &[u64]) -> Value {
    if competitor_subscribers.is_empty() {
        return json!("No competitors found");
    }
    let avg = average(competitor_subscribers);
    let position = if target_subscribers as f64 > avg {
        "leader"
    } else {
        "follower"
    };
    let difference = if avg > 0.0 {
        format!("{:.1}%", (target_subscribers as f64 - avg) / avg * 100.0)
    } else {
        "n/a".to_string()
    };

    json!({
        "market_position": position,
        "subscriber_comparison": {
            "target": target_subscribers,
            "average_competitor": avg,
            "difference_percentage": difference,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(text: &str, likes: u64, published_at: &str) -> CommentRecord {
        CommentRecord {
            text: text.to_string(),
            author: "viewer".to_string(),
            likes,
            published_at: published_at.to_string(),
            updated_at: published_at.to_string(),
        }
    }

    #[test]
    fn test_engagement_rate_guards_zero_views() {
        assert_eq!(engagement_rate(10, 5, 0), 0.0);
        assert!((engagement_rate(40, 10, 1000) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_of_empty_is_zero() {
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[100, 200]), 150.0);
    }

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_iso_duration("PT1H2M3S"), 3723);
        assert_eq!(parse_iso_duration("PT4M13S"), 253);
        assert_eq!(parse_iso_duration("PT45S"), 45);
        assert_eq!(parse_iso_duration("garbage"), 0);
        assert_eq!(parse_iso_duration(""), 0);
        assert_eq!(format_minutes_seconds(253), "4m 13s");
    }

    #[test]
    fn test_parse_iso_duration_overflow_is_zero() {
        assert_eq!(parse_iso_duration("PT9999999999999999H"), 0);
        assert_eq!(parse_iso_duration("PT1H999999999999999999M"), 0);
        assert_eq!(parse_iso_duration("PT5124095576030431H15S"), u64::MAX);
    }

    #[test]
    fn test_upload_frequency() {
        assert_eq!(upload_frequency(&[]), "No videos found");
        assert_eq!(
            upload_frequency(&[
                "2024-03-10T12:00:00Z",
                "2024-03-01T12:00:00Z",
                "2024-03-04T12:00:00Z",
            ]),
            "4.5 days between uploads"
        );
        assert_eq!(
            upload_frequency(&["2024-03-10T12:00:00Z"]),
            "0.0 days between uploads"
        );
    }

    #[test]
    fn test_content_types_from_titles() {
        assert_eq!(
            content_types(["How to train a model", "GPU review", "Weekly news"]),
            vec!["news", "reviews", "tutorials"]
        );
        assert_eq!(content_types(["Just a clip"]), vec!["general content"]);
    }

    #[test]
    fn test_like_sentiment_buckets() {
        assert_eq!(like_sentiment(&[]), "No comments available");
        assert_eq!(like_sentiment(&[20, 4]), "Very positive");
        assert_eq!(like_sentiment(&[6]), "Positive");
        assert_eq!(like_sentiment(&[3]), "Neutral");
        assert_eq!(like_sentiment(&[0, 1]), "Mixed");
    }

    #[test]
    fn test_rank_by_frequency_breaks_ties_by_first_appearance() {
        let ranked = rank_by_frequency(["b", "a", "a", "c", "b", "d"]);
        assert_eq!(
            ranked,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_comment_aggregates_on_empty_input() {
        assert_eq!(comment_engagement(&[]), json!(NO_COMMENTS));
        assert_eq!(comment_sentiment(&[]), json!(NO_COMMENTS));
        assert_eq!(comment_topics(&[]), json!(NO_COMMENTS));
        assert_eq!(comment_timeline(&[]), json!(NO_COMMENTS));
    }

    #[test]
    fn test_comment_sentiment_scores_keywords_and_likes() {
        let comments = vec![
            comment("This is great!", 30, "2024-01-01T10:00:00Z"),
            comment("boring and confusing", 0, "2024-01-01T11:00:00Z"),
        ];
        let sentiment = comment_sentiment(&comments);
        // (1 + 2) and (-2)
        assert_eq!(sentiment["average_sentiment_score"], "0.5");
        assert_eq!(sentiment["overall_sentiment"], "Positive");
        assert_eq!(sentiment["sentiment_distribution"]["very_positive"], 1);
        assert_eq!(sentiment["sentiment_distribution"]["negative"], 1);
    }

    #[test]
    fn test_comment_timeline_peak_hour() {
        let comments = vec![
            comment("one", 0, "2024-01-02T09:15:00Z"),
            comment("two", 0, "2024-01-01T14:00:00Z"),
            comment("three", 0, "2024-01-03T14:30:00Z"),
        ];
        let timeline = comment_timeline(&comments);
        assert_eq!(timeline["first_comment"], "2024-01-01T14:00:00Z");
        assert_eq!(timeline["last_comment"], "2024-01-03T14:30:00Z");
        assert_eq!(timeline["peak_hour"], 14);
        assert_eq!(timeline["hourly_distribution"]["9"], 1);
    }

    #[test]
    fn test_market_position_with_zero_average() {
        let position = market_position(100, &[0, 0]);
        assert_eq!(position["market_position"], "leader");
        assert_eq!(position["subscriber_comparison"]["difference_percentage"], "n/a");

        let position = market_position(50, &[100, 200]);
        assert_eq!(position["market_position"], "follower");
        assert_eq!(
            position["subscriber_comparison"]["difference_percentage"],
            "-66.7%"
        );
        assert_eq!(market_position(1, &[]), json!("No competitors found"));
    }
}
