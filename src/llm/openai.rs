//! OpenAI-compatible chat completions via async-openai.

use super::{ChatMessage, ChatModel, Role};
use crate::error::{HuskError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

const PROVIDER: &str = "language model";

/// Create a client for an OpenAI-compatible endpoint with a request timeout.
pub fn create_client(
    api_base: &str,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| HuskError::Config(format!("Failed to create HTTP client: {}", e)))?;

    // Local servers accept any key, but the header must be present.
    let config = OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(api_key.unwrap_or("not-needed"));

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Chat model served by an OpenAI-compatible API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
}

impl OpenAIChatModel {
    pub fn new(api_base: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(api_base, api_key, timeout)?,
        })
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let build_error = |e: async_openai::error::OpenAIError| HuskError::Validation(e.to_string());

    Ok(match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(build_error)?
            .into(),
    })
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<Vec<String>> {
        let messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .temperature(temperature)
            .build()
            .map_err(|e| HuskError::Validation(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| match e {
            async_openai::error::OpenAIError::Reqwest(err) if err.is_timeout() => {
                HuskError::Timeout(format!("{} request: {}", PROVIDER, err))
            }
            other => HuskError::provider(PROVIDER, other.to_string()),
        })?;

        debug!("Received {} choices", response.choices.len());

        Ok(response
            .choices
            .into_iter()
            .map(|c| c.message.content.unwrap_or_default())
            .collect())
    }
}
