//! Lexicon-based text sentiment for drafts and captions.

use super::{parse_args, AnalysisTool};
use crate::error::{AgencyError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Polarity in [-1, 1] and subjectivity in [0, 1] of a text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
}

/// Score `text` with the VADER lexicon.
///
/// Polarity is the normalized compound score. Subjectivity is the share of
/// the text carrying sentiment at all (positive plus negative proportions).
pub fn score_text(text: &str) -> Sentiment {
    let analyzer = SentimentIntensityAnalyzer::new();
    let scores = analyzer.polarity_scores(text);
    let score = |key: &str| scores.get(key).copied().unwrap_or(0.0);

    Sentiment {
        polarity: score("compound").clamp(-1.0, 1.0),
        subjectivity: (score("pos") + score("neg")).clamp(0.0, 1.0),
    }
}

/// Readable bucket for a polarity score.
pub fn assessment(polarity: f64) -> &'static str {
    if polarity > 0.5 {
        "Very Positive"
    } else if polarity > 0.0 {
        "Slightly Positive"
    } else if polarity == 0.0 {
        "Neutral"
    } else if polarity > -0.5 {
        "Slightly Negative"
    } else {
        "Very Negative"
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    text: String,
    context: String,
}

/// Sentiment of a piece of content in its publishing context.
pub struct SentimentAnalyzer;

#[async_trait]
impl AnalysisTool for SentimentAnalyzer {
    fn name(&self) -> &'static str {
        "sentiment_analyzer"
    }

    fn description(&self) -> &'static str {
        "Analyze the sentiment of text content: polarity (-1 to 1), subjectivity (0 to 1) and a readable assessment."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "The text content to analyze for sentiment" },
                "context": {
                    "type": "string",
                    "description": "Where the text will be used (e.g., social media, blog)"
                }
            },
            "required": ["text", "context"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;
        if args.text.trim().is_empty() {
            return Err(AgencyError::InvalidInput("No text provided".to_string()));
        }
        info!(
            "Analyzing sentiment of {} chars for {}",
            args.text.chars().count(),
            args.context
        );

        let sentiment = score_text(&args.text);
        Ok(json!({
            "polarity": sentiment.polarity,
            "subjectivity": sentiment.subjectivity,
            "assessment": assessment(sentiment.polarity),
            "context": args.context,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_buckets() {
        assert_eq!(assessment(0.9), "Very Positive");
        assert_eq!(assessment(0.5), "Slightly Positive");
        assert_eq!(assessment(0.01), "Slightly Positive");
        assert_eq!(assessment(0.0), "Neutral");
        assert_eq!(assessment(-0.2), "Slightly Negative");
        assert_eq!(assessment(-0.5), "Very Negative");
        assert_eq!(assessment(-1.0), "Very Negative");
    }

    #[test]
    fn test_scores_follow_tone() {
        let happy = score_text("I absolutely love this product! It's amazing and life-changing!");
        assert!(happy.polarity > 0.5);
        assert!(happy.subjectivity > 0.0);

        let unhappy =
            score_text("I'm very disappointed with the terrible service and poor quality.");
        assert!(unhappy.polarity < 0.0);

        let flat = score_text("The meeting is on Tuesday.");
        assert_eq!(flat.polarity, 0.0);
        assert_eq!(flat.subjectivity, 0.0);
    }

    #[tokio::test]
    async fn test_payload_shape() {
        let result = SentimentAnalyzer
            .run(json!({ "text": "This tutorial is great!", "context": "blog" }))
            .await
            .to_value();
        assert_eq!(result["status"], "success");
        assert_eq!(result["context"], "blog");
        assert!(result["polarity"].as_f64().unwrap() > 0.0);
        assert!(result["assessment"].as_str().unwrap().contains("Positive"));
    }

    #[tokio::test]
    async fn test_missing_context_or_empty_text_is_error_record() {
        let result = SentimentAnalyzer.run(json!({ "text": "fine" })).await;
        assert!(!result.is_success());

        let result = SentimentAnalyzer
            .run(json!({ "text": "  ", "context": "blog" }))
            .await;
        assert!(!result.is_success());
    }
}
