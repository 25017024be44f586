//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the chat-completion LLM behind the AI endpoints.
//! It implements the `CompletionService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use issuezz_core::ports::{
    CompletionPurpose, CompletionRequest, CompletionService, PortError, PortResult,
};
use tracing::debug;

/// Model names per AI endpoint.
#[derive(Clone, Debug)]
pub struct CompletionModels {
    pub suggest: String,
    pub review: String,
    pub follow_up: String,
}

impl CompletionModels {
    fn for_purpose(&self, purpose: CompletionPurpose) -> &str {
        match purpose {
            CompletionPurpose::Suggest => &self.suggest,
            CompletionPurpose::Review => &self.review,
            CompletionPurpose::FollowUp => &self.follow_up,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    models: CompletionModels,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, models: CompletionModels) -> Self {
        Self { client, models }
    }

    fn messages(request: &CompletionRequest) -> PortResult<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        Ok(messages)
    }
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiCompletionAdapter {
    async fn complete(&self, request: CompletionRequest) -> PortResult<String> {
        let model = self.models.for_purpose(request.purpose);
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(Self::messages(&request)?)
            .max_tokens(request.max_tokens)
            .temperature(request.temperature)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!("Sending {:?} completion to {}", request.purpose, model);
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream {
                status: 502,
                message: e.to_string(),
            })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Malformed("Completion LLM returned no text content.".to_string())
            })
    }
}
