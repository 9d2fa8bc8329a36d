// OpenAI-compatible chat completions adapter
// Also backs Groq, OpenRouter and GLM, which expose the same /chat/completions dialect.

use crate::llm::LLMAdapter;
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use tracing::debug;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAIAdapter {
    client: Client<OpenAIConfig>,
    api_key: String,
    api_base: String,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::new_with_api_base(api_key, OPENAI_API_BASE)
    }

    pub fn new_with_api_base(api_key: &str, api_base: &str) -> Self {
        let api_base = api_base.trim_end_matches('/').to_string();
        Self {
            client: Client::with_config(Self::config(api_key, &api_base)),
            api_key: api_key.to_string(),
            api_base,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if let Ok(http) = reqwest::Client::builder().timeout(timeout).build() {
            self.client = Client::with_config(Self::config(&self.api_key, &self.api_base)).with_http_client(http);
        }
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn config(api_key: &str, api_base: &str) -> OpenAIConfig {
        OpenAIConfig::new().with_api_key(api_key).with_api_base(api_base)
    }

    fn build_messages(request: &LLMRequest) -> AppResult<Vec<ChatCompletionRequestMessage>> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system_instruction {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system.as_str())
                    .build()?
                    .into(),
            );
        }

        for message in &request.messages {
            let built: ChatCompletionRequestMessage = match message.role.as_str() {
                "user" => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.as_str())
                    .build()?
                    .into(),
                "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.as_str())
                    .build()?
                    .into(),
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(message.content.as_str())
                    .build()?
                    .into(),
                other => return Err(AppError::Internal(format!("Unknown message role: {}", other))),
            };
            messages.push(built);
        }

        Ok(messages)
    }

    fn build_request(request: &LLMRequest, stream: bool) -> AppResult<CreateChatCompletionRequest> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(request.model.as_str()).messages(Self::build_messages(request)?);
        if let Some(max_tokens) = request.max_tokens {
            args.max_tokens(max_tokens);
        }
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }
        if stream {
            args.stream(true);
        }
        Ok(args.build()?)
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let body = Self::build_request(request, false)?;
        debug!(model = %request.model, api_base = %self.api_base, "Sending chat completion request");

        let response = self.client.chat().create(body).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLMApi("Provider returned no choices".to_string()))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        let finish_reason = choice
            .finish_reason
            .and_then(|reason| serde_json::to_value(reason).ok())
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| "stop".to_string());

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason,
            usage,
        })
    }

    async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        let body = Self::build_request(request, true)?;
        debug!(model = %request.model, api_base = %self.api_base, "Opening chat completion stream");

        let stream = self.client.chat().create_stream(body).await?;

        // Role-only and empty deltas carry no text.
        let deltas = stream.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => {
                    let text: String = chunk
                        .choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(AppError::from(e))),
            }
        });

        Ok(deltas.boxed())
    }
}
