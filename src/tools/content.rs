//! Content drafting tools: idea generation and script files.

use super::{parse_args, AnalysisTool};
use crate::error::{AgencyError, Result};
use crate::openai::OpenAIClient;
use crate::retry::{with_retry, RetryPolicy};
use crate::text::{preview, PREVIEW_CHARS};
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

const STRATEGIST_PROMPT: &str =
    "You are a creative content strategist specializing in AI and technology content.";

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Deserialize)]
struct GenerateArgs {
    prompt: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
}

/// Creative content ideas from a brief.
pub struct ContentGenerator {
    client: OpenAIClient,
    model: String,
    retry: RetryPolicy,
}

impl ContentGenerator {
    pub fn new(client: OpenAIClient, model: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            retry,
        }
    }
}

#[async_trait]
impl AnalysisTool for ContentGenerator {
    fn name(&self) -> &'static str {
        "content_generator"
    }

    fn description(&self) -> &'static str {
        "Generate creative content ideas, outlines or drafts from a creative brief."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": { "type": "string", "description": "The creative brief or context for content generation" },
                "temperature": {
                    "type": "number",
                    "description": "Creativity level (0.0-1.0)",
                    "minimum": 0.0,
                    "maximum": 1.0,
                    "default": 0.7
                }
            },
            "required": ["prompt"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: GenerateArgs = parse_args(self.name(), input)?;
        if !(0.0..=1.0).contains(&args.temperature) {
            return Err(AgencyError::InvalidInput(format!(
                "temperature must be between 0.0 and 1.0, got {}",
                args.temperature
            )));
        }
        info!("Generating content at temperature {}", args.temperature);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(args.temperature)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(STRATEGIST_PROMPT)
                    .build()
                    .map_err(|e| AgencyError::OpenAI(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(args.prompt.clone())
                    .build()
                    .map_err(|e| AgencyError::OpenAI(e.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|e| AgencyError::OpenAI(e.to_string()))?;

        let response = with_retry(&self.retry, "openai.content_generator", || async {
            self.client
                .chat()
                .create(request.clone())
                .await
                .map_err(|e| AgencyError::OpenAI(e.to_string()))
        })
        .await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AgencyError::OpenAI("No content in response".to_string()))?;
        info!("Generated content: {}", preview(&content, PREVIEW_CHARS));

        Ok(json!({ "content": content }))
    }
}

#[derive(Debug, Deserialize)]
struct ScriptArgs {
    content: String,
    file_name: String,
}

/// Saves Markdown script drafts to the scripts directory.
pub struct ScriptWriter {
    scripts_dir: PathBuf,
}

impl ScriptWriter {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
        }
    }

    /// Resolve a user-supplied name to a `.md` file inside the scripts directory.
    fn script_path(&self, file_name: &str) -> Result<PathBuf> {
        let name = file_name.trim();
        let plain = Path::new(name)
            .file_name()
            .is_some_and(|n| n == name && name != "." && name != "..");
        if name.is_empty() || !plain {
            return Err(AgencyError::InvalidInput(format!(
                "Invalid script file name: {:?}",
                file_name
            )));
        }
        let name = if name.ends_with(".md") {
            name.to_string()
        } else {
            format!("{}.md", name)
        };
        Ok(self.scripts_dir.join(name))
    }
}

#[async_trait]
impl AnalysisTool for ScriptWriter {
    fn name(&self) -> &'static str {
        "script_writer"
    }

    fn description(&self) -> &'static str {
        "Save a complete video script in Markdown format and return its content and location."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string", "description": "The complete script content in Markdown" },
                "file_name": { "type": "string", "description": "Name of the file to save the script as" }
            },
            "required": ["content", "file_name"]
        })
    }

    async fn analyze(&self, input: Value) -> Result<Value> {
        let args: ScriptArgs = parse_args(self.name(), input)?;
        let path = self.script_path(&args.file_name)?;

        tokio::fs::create_dir_all(&self.scripts_dir).await?;
        tokio::fs::write(&path, &args.content).await?;
        info!(
            "Saved script ({} chars) to {}",
            args.content.chars().count(),
            path.display()
        );

        Ok(json!({
            "content": args.content,
            "file_path": path.display().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_script_writer_adds_extension() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ScriptWriter::new(dir.path().join("scripts"));

        let result = writer
            .run(json!({ "content": "# Intro\n\nHello", "file_name": "episode-1" }))
            .await
            .to_value();

        assert_eq!(result["status"], "success");
        let saved = dir.path().join("scripts").join("episode-1.md");
        assert_eq!(result["file_path"], saved.display().to_string());
        assert_eq!(std::fs::read_to_string(saved).unwrap(), "# Intro\n\nHello");
    }

    #[tokio::test]
    async fn test_script_writer_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ScriptWriter::new(dir.path());
        for name in ["../escape", "nested/script.md", "", ".."] {
            let result = writer
                .run(json!({ "content": "x", "file_name": name }))
                .await;
            assert!(!result.is_success(), "accepted {:?}", name);
        }
    }

    #[tokio::test]
    async fn test_content_generator_validates_temperature() {
        let client = crate::openai::create_client().unwrap();
        let generator =
            ContentGenerator::new(client, "gpt-4o", RetryPolicy::new(1, Duration::ZERO));
        let result = generator
            .run(json!({ "prompt": "ideas", "temperature": 1.5 }))
            .await
            .to_value();
        assert_eq!(result["status"], "error");
        assert!(result["error"].as_str().unwrap().contains("temperature"));
    }
}
