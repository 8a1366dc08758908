//! OpenAI-backed agency with tool calling and agent-to-agent delegation.

use super::profile::{AgencyChart, AgentProfile};
use super::CompletionAgent;
use crate::config::{AgencySettings, Settings};
use crate::error::{AgencyError, Result};
use crate::openai::{create_client, OpenAIClient};
use crate::retry::{with_retry, RetryPolicy};
use crate::text::{preview, PREVIEW_CHARS};
use crate::tools::{AnalysisResult, ToolRegistry};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, CreateChatCompletionResponse, FunctionObject,
};
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the delegation tool offered to agents with outgoing flows.
const SEND_MESSAGE: &str = "send_message";

#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    recipient: String,
    message: String,
}

fn build_err(e: impl std::fmt::Display) -> AgencyError {
    AgencyError::Agent(e.to_string())
}

/// The agency: agent profiles, their tools and an OpenAI client.
pub struct Agency {
    client: OpenAIClient,
    chart: AgencyChart,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_iterations: usize,
    max_delegation_depth: usize,
    retry: RetryPolicy,
}

impl Agency {
    pub fn new(
        client: OpenAIClient,
        chart: AgencyChart,
        tools: Arc<ToolRegistry>,
        settings: &AgencySettings,
        retry: RetryPolicy,
    ) -> Self {
        for agent in &chart.agents {
            for tool in &agent.tools {
                if !tools.contains(tool) {
                    warn!("Agent {} references unregistered tool {}", agent.name, tool);
                }
            }
        }
        Self {
            client,
            chart,
            tools,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_iterations: settings.max_iterations,
            max_delegation_depth: settings.max_delegation_depth,
            retry,
        }
    }

    /// Standard agency from settings, sharing an existing tool registry.
    pub fn from_settings(settings: &Settings, tools: Arc<ToolRegistry>) -> Result<Self> {
        Ok(Self::new(
            create_client()?,
            AgencyChart::standard(),
            tools,
            &settings.agency,
            settings.retry.policy(),
        ))
    }

    pub fn chart(&self) -> &AgencyChart {
        &self.chart
    }

    /// Send a message to a named agent and return its final reply.
    pub async fn ask(&self, agent: &str, message: &str) -> Result<String> {
        let profile = self
            .chart
            .agent(agent)
            .ok_or_else(|| AgencyError::NotFound(format!("Unknown agent: {}", agent)))?;
        self.run_agent(profile, message.to_string(), 0).await
    }

    /// Function definitions offered to `profile` at this delegation depth.
    fn tool_definitions(&self, profile: &AgentProfile, depth: usize) -> Vec<ChatCompletionTool> {
        let mut definitions: Vec<ChatCompletionTool> = self
            .tools
            .specs(Some(profile.tools.as_slice()))
            .into_iter()
            .map(|spec| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: spec.name.to_string(),
                    description: Some(spec.description.to_string()),
                    parameters: Some(spec.parameters),
                    strict: None,
                },
            })
            .collect();

        let recipients = self.chart.recipients(profile.name);
        if !recipients.is_empty() && depth < self.max_delegation_depth {
            let names: Vec<&str> = recipients.iter().map(|a| a.name).collect();
            let roster = recipients
                .iter()
                .map(|a| format!("{}: {}", a.name, a.description))
                .collect::<Vec<_>>()
                .join("\n");
            definitions.push(ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: SEND_MESSAGE.to_string(),
                    description: Some(format!(
                        "Send a message to another agent and wait for its reply. Available agents:\n{}",
                        roster
                    )),
                    parameters: Some(json!({
                        "type": "object",
                        "properties": {
                            "recipient": { "type": "string", "enum": names },
                            "message": {
                                "type": "string",
                                "description": "Task for the recipient with all context it needs"
                            }
                        },
                        "required": ["recipient", "message"]
                    })),
                    strict: None,
                },
            });
        }
        definitions
    }

    /// Run one agent to completion. Framed agents report failures inside their frame.
    fn run_agent<'a>(
        &'a self,
        profile: &'a AgentProfile,
        message: String,
        depth: usize,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            info!(
                "{} processing message: {}",
                profile.name,
                preview(&message, PREVIEW_CHARS)
            );
            match self.tool_loop(profile, &message, depth).await {
                Ok(response) => {
                    let response = profile.finalize(&response);
                    info!(
                        "{} response: {}",
                        profile.name,
                        preview(&response, PREVIEW_CHARS)
                    );
                    Ok(response)
                }
                Err(e) if profile.frame.is_some() => {
                    warn!("{} failed: {}", profile.name, e);
                    Ok(profile.finalize(&format!("Error occurred during analysis: {}", e)))
                }
                Err(e) => Err(e),
            }
        }
        .boxed()
    }

    async fn tool_loop(&self, profile: &AgentProfile, message: &str, depth: usize) -> Result<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(profile.system_prompt())
                .build()
                .map_err(build_err)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(message.to_string())
                .build()
                .map_err(build_err)?
                .into(),
        ];
        let tools = self.tool_definitions(profile, depth);

        for iteration in 1..=self.max_iterations {
            debug!("{} iteration {}", profile.name, iteration);

            let mut request = CreateChatCompletionRequestArgs::default();
            request
                .model(&self.model)
                .temperature(profile.temperature.unwrap_or(self.temperature))
                .messages(messages.clone());
            if !tools.is_empty() {
                request.tools(tools.clone());
            }
            let response = self.complete(request.build().map_err(build_err)?).await?;

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| AgencyError::Agent("No response from model".to_string()))?;

            let tool_calls = match choice.message.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => return Ok(choice.message.content.unwrap_or_default()),
            };

            messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .tool_calls(tool_calls.clone())
                    .build()
                    .map_err(build_err)?
                    .into(),
            );

            for tool_call in &tool_calls {
                let result = self.execute_tool_call(profile, tool_call, depth).await;
                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&tool_call.id)
                        .content(result)
                        .build()
                        .map_err(build_err)?
                        .into(),
                );
            }
        }

        Err(AgencyError::Agent(format!(
            "{} exceeded maximum iterations ({})",
            profile.name, self.max_iterations
        )))
    }

    async fn complete(&self, request: CreateChatCompletionRequest) -> Result<CreateChatCompletionResponse> {
        with_retry(&self.retry, "openai.chat", || async {
            self.client
                .chat()
                .create(request.clone())
                .await
                .map_err(|e| AgencyError::OpenAI(e.to_string()))
        })
        .await
    }

    async fn execute_tool_call(
        &self,
        profile: &AgentProfile,
        tool_call: &ChatCompletionMessageToolCall,
        depth: usize,
    ) -> String {
        let name = tool_call.function.name.as_str();
        let arguments = tool_call.function.arguments.as_str();
        info!("{} calling tool: {} with args: {}", profile.name, name, arguments);

        if name == SEND_MESSAGE {
            return self.delegate(profile, arguments, depth).await;
        }
        if !profile.tools.iter().any(|t| *t == name) {
            return AnalysisResult::error(format!(
                "Tool {} is not available to {}",
                name, profile.name
            ))
            .to_json_string();
        }
        self.tools.run_raw(name, arguments).await.to_json_string()
    }

    /// Forward a message to another agent. Failures come back as text.
    async fn delegate(&self, sender: &AgentProfile, arguments: &str, depth: usize) -> String {
        let args: SendMessageArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => return format!("Error: invalid send_message arguments: {}", e),
        };
        if depth >= self.max_delegation_depth {
            return format!(
                "Error: delegation depth limit ({}) reached",
                self.max_delegation_depth
            );
        }
        if !self.chart.can_message(sender.name, &args.recipient) {
            return format!(
                "Error: {} cannot message {}",
                sender.name, args.recipient
            );
        }
        let Some(recipient) = self.chart.agent(&args.recipient) else {
            return format!("Error: unknown agent {}", args.recipient);
        };

        info!("Communication: {} -> {}", sender.name, recipient.name);
        info!("Message preview: {}", preview(&args.message, PREVIEW_CHARS));

        match self.run_agent(recipient, args.message, depth + 1).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{} failed to answer {}: {}", recipient.name, sender.name, e);
                format!("Error from {}: {}", recipient.name, e)
            }
        }
    }
}

#[async_trait]
impl CompletionAgent for Agency {
    async fn get_completion(&self, prompt: &str) -> Result<String> {
        self.ask(self.chart.entry, prompt).await
    }
}
