//! Chat completion client used for every interviewer turn.

use crate::response::{AiTurnResponse, parse_turn_response};
use crate::transcript::{Role, Turn};
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// One call to the completion service: an instruction payload plus the
/// conversation so far, newest turn last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub instruction: String,
    pub turns: Vec<Turn>,
}

/// The AI completion service that plays the interviewer.
///
/// Implementations return the raw text of the model's reply; parsing and
/// validation are the caller's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// An implementation of `CompletionService` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

/// Maps transcript turns onto chat messages. Directives are sent as system
/// messages so the model never mistakes them for the candidate speaking.
fn to_chat_messages(request: CompletionRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.instruction)
            .build()?
            .into(),
    ];
    for turn in request.turns {
        let message: ChatCompletionRequestMessage = match turn.role {
            Role::Interviewer => ChatCompletionRequestAssistantMessageArgs::default()
                .content(turn.text)
                .build()?
                .into(),
            Role::Candidate => ChatCompletionRequestUserMessageArgs::default()
                .content(turn.text)
                .build()?
                .into(),
            Role::Directive => ChatCompletionRequestSystemMessageArgs::default()
                .content(turn.text)
                .build()?
                .into(),
        };
        messages.push(message);
    }
    Ok(messages)
}

#[async_trait]
impl CompletionService for OpenAICompatibleClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(to_chat_messages(request)?)
            .response_format(ResponseFormat::JsonObject)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .clone()
            .context("No content in LLM response")?;
        Ok(content)
    }
}

/// Calls the completion service and parses a structured turn reply.
///
/// Connection failures, timeouts and unparsable output are all logged and
/// collapse to `None`; callers substitute scripted content.
pub async fn request_turn_response(
    service: &dyn CompletionService,
    timeout: Duration,
    request: CompletionRequest,
) -> Option<AiTurnResponse> {
    let raw = match tokio::time::timeout(timeout, service.complete(request)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!(error = ?e, "Completion service unavailable; using fallback content");
            return None;
        }
        Err(_) => {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Completion service timed out; using fallback content"
            );
            return None;
        }
    };
    match parse_turn_response(&raw) {
        Ok(response) => Some(response),
        Err(e) => {
            warn!(error = %e, "Unparsable completion response; using fallback content");
            None
        }
    }
}
