//! Agent profiles and the communication chart between them.

/// Instructions shared by every agent in the agency.
pub const AGENCY_MANIFESTO: &str = r#"You are part of a content creation agency that helps creators plan, research and write AI and technology content.

Agency principles:
- Ground recommendations in data from your tools; say so when data is unavailable.
- Tool results are JSON records with a "status" field. Treat "error" records as missing data, not as facts.
- Keep answers structured with headers and lists, and finish with concrete next steps."#;

const CONTENT_MANAGER_INSTRUCTIONS: &str = r#"You are the Content Manager and the user's point of contact.

- Clarify the creator's goal, audience and format before producing content.
- Delegate YouTube research (channels, videos, comments, competitors) to the YouTube Analyzer.
- Delegate search trends and web/competitor research to the Trend Analyzer.
- Use content_generator for ideas and outlines, keyword_extractor to pick target keywords and sentiment_analyzer to check the tone of drafts.
- When asked for a script, write it in Markdown and save it with script_writer, then return the full script."#;

const TREND_ANALYZER_INSTRUCTIONS: &str = r#"You are the Trend Analyzer.

- Use trend_analyzer for search interest over time and related queries (at most five keywords per call).
- Use web_search for recent news and web_competitor_analyzer for competitor activity.
- Use keyword_extractor to distill keywords from long text before analyzing trends.
- Summarize rising topics, declining topics and concrete content opportunities."#;

const YOUTUBE_ANALYZER_INSTRUCTIONS: &str = r#"You are the YouTube Analyzer.

- Use video_searcher to find videos, then video_performance_analyzer and comment_analyzer for details.
- Use channel_analyzer for channel performance and channel_competitor_analyzer for the competitive landscape.
- Ask the Trend Analyzer when search trend data would strengthen a recommendation.
- Report engagement rates, audience sentiment and content gaps."#;

pub const CONTENT_MANAGER: &str = "Content Manager";
pub const TREND_ANALYZER: &str = "Trend Analyzer";
pub const YOUTUBE_ANALYZER: &str = "YouTube Analyzer";

/// Required opening and closing lines of an agent's replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl ResponseFrame {
    /// Add the prefix and suffix unless the reply already carries them.
    pub fn apply(&self, response: &str) -> String {
        let mut framed = if response.starts_with(self.prefix) {
            response.to_string()
        } else {
            format!("{}\n{}", self.prefix, response)
        };
        if !framed.trim_end().ends_with(self.suffix) {
            framed.push('\n');
            framed.push_str(self.suffix);
        }
        framed
    }
}

/// Static description of one agent.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub instructions: &'static str,
    /// Names of the registry tools this agent may call.
    pub tools: Vec<&'static str>,
    /// Sampling temperature; `None` uses the agency default.
    pub temperature: Option<f32>,
    pub frame: Option<ResponseFrame>,
}

impl AgentProfile {
    /// System prompt: shared manifesto followed by the agent's own instructions.
    pub fn system_prompt(&self) -> String {
        format!("{}\n\n{}", AGENCY_MANIFESTO, self.instructions)
    }

    /// Apply the response frame, if any.
    pub fn finalize(&self, response: &str) -> String {
        match &self.frame {
            Some(frame) => frame.apply(response),
            None => response.to_string(),
        }
    }
}

/// Agents, the entry point and the allowed sender -> recipient flows.
#[derive(Debug, Clone)]
pub struct AgencyChart {
    pub entry: &'static str,
    pub agents: Vec<AgentProfile>,
    pub flows: Vec<(&'static str, &'static str)>,
}

impl AgencyChart {
    /// The content creation agency: a manager in front of two analysts.
    pub fn standard() -> Self {
        let analysis_frame = |prefix: &'static str| {
            Some(ResponseFrame {
                prefix,
                suffix: "Analysis Complete",
            })
        };

        Self {
            entry: CONTENT_MANAGER,
            agents: vec![
                AgentProfile {
                    name: CONTENT_MANAGER,
                    description: "Manages content strategy and coordinates between different analysis tools.",
                    instructions: CONTENT_MANAGER_INSTRUCTIONS,
                    tools: vec![
                        "content_generator",
                        "script_writer",
                        "keyword_extractor",
                        "sentiment_analyzer",
                    ],
                    temperature: None,
                    frame: None,
                },
                AgentProfile {
                    name: TREND_ANALYZER,
                    description: "Analyzes current trends and patterns in content to identify opportunities.",
                    instructions: TREND_ANALYZER_INSTRUCTIONS,
                    tools: vec![
                        "trend_analyzer",
                        "web_competitor_analyzer",
                        "web_search",
                        "keyword_extractor",
                    ],
                    temperature: Some(0.5),
                    frame: analysis_frame("Trend Analysis Results:"),
                },
                AgentProfile {
                    name: YOUTUBE_ANALYZER,
                    description: "Analyzes YouTube channel performance, audience and competitor content to identify opportunities and gaps.",
                    instructions: YOUTUBE_ANALYZER_INSTRUCTIONS,
                    tools: vec![
                        "channel_analyzer",
                        "video_performance_analyzer",
                        "comment_analyzer",
                        "channel_competitor_analyzer",
                        "video_searcher",
                    ],
                    temperature: Some(0.5),
                    frame: analysis_frame("YouTube Analysis Results:"),
                },
            ],
            flows: vec![
                (CONTENT_MANAGER, YOUTUBE_ANALYZER),
                (CONTENT_MANAGER, TREND_ANALYZER),
                (YOUTUBE_ANALYZER, TREND_ANALYZER),
            ],
        }
    }

    pub fn agent(&self, name: &str) -> Option<&AgentProfile> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn can_message(&self, sender: &str, recipient: &str) -> bool {
        self.flows
            .iter()
            .any(|(from, to)| *from == sender && *to == recipient)
    }

    /// Agents `sender` may delegate to, in chart order.
    pub fn recipients(&self, sender: &str) -> Vec<&AgentProfile> {
        self.flows
            .iter()
            .filter(|(from, _)| *from == sender)
            .filter_map(|(_, to)| self.agent(to))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_wraps_bare_reply() {
        let frame = ResponseFrame {
            prefix: "Trend Analysis Results:",
            suffix: "Analysis Complete",
        };
        assert_eq!(
            frame.apply("AI video is rising."),
            "Trend Analysis Results:\nAI video is rising.\nAnalysis Complete"
        );
    }

    #[test]
    fn test_frame_is_idempotent() {
        let frame = ResponseFrame {
            prefix: "YouTube Analysis Results:",
            suffix: "Analysis Complete",
        };
        let once = frame.apply("Views are up.");
        assert_eq!(frame.apply(&once), once);
    }

    #[test]
    fn test_standard_flows() {
        let chart = AgencyChart::standard();
        assert!(chart.can_message(CONTENT_MANAGER, YOUTUBE_ANALYZER));
        assert!(chart.can_message(CONTENT_MANAGER, TREND_ANALYZER));
        assert!(chart.can_message(YOUTUBE_ANALYZER, TREND_ANALYZER));
        assert!(!chart.can_message(TREND_ANALYZER, CONTENT_MANAGER));
        assert!(!chart.can_message(TREND_ANALYZER, YOUTUBE_ANALYZER));
        assert!(chart.recipients(TREND_ANALYZER).is_empty());
        assert_eq!(chart.recipients(CONTENT_MANAGER).len(), 2);
        assert!(chart.agent(chart.entry).unwrap().frame.is_none());
    }
}
