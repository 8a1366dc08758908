//! Frequency-based keyword extraction.

use super::metrics::rank_by_frequency;
use super::{parse_args, AnalysisTool};
use crate::error::{AgencyError, Result};
use crate::text::words;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// English stop words ignored when counting keywords.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Keywords ranked by frequency plus the number of candidate words seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Keywords {
    pub ranked: Vec<(String, usize)>,
    pub total_found: usize,
}

/// Top `max_keywords` non-stop-words longer than two characters.
pub fn extract_keywords(text: &str, max_keywords: usize) -> Keywords {
    let candidates: Vec<String> = words(text)
        .into_iter()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect();
    let total_found = candidates.len();

    let mut ranked = rank_by_frequency(candidates);
    ranked.truncate(max_keywords);

    Keywords {
        ranked,
        total_found,
    }
}

fn default_max_keywords() -> usize {
    10
}

#[derive(Debug, Deserialize)]
struct Args {
    text: String,
    #[serde(default = "default_max_keywords")]
    max_keywords: usize,
}

/// Extracts the most frequent meaningful words from a text.
pub struct KeywordExtractor;

#[async_trait]
impl AnalysisTool for KeywordExtractor {
    fn name(&self) -> &'static str {
        "keyword_extractor"
    }

    fn description(&self) -> &'static str {
        "Extract the most frequent keywords from text content, ignoring common stop words."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "Text content to analyze" },
                "max_keywords": {
                    "type": "integer",
                    "description": "Maximum number of keywords to extract",
                    "minimum": 1,
                    "default": 10
                }
            },
            "required": ["text"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: Args = parse_args(self.name(), input)?;
        if args.max_keywords == 0 {
            return Err(AgencyError::InvalidInput(
                "max_keywords must be greater than 0".to_string(),
            ));
        }

        let keywords = extract_keywords(&args.text, args.max_keywords);
        let ranked: Vec<Value> = keywords
            .ranked
            .iter()
            .map(|(keyword, count)| json!({ "keyword": keyword, "count": count }))
            .collect();

        Ok(json!({
            "keywords": ranked,
            "total_keywords_found": keywords.total_found,
        }))
    }
}
