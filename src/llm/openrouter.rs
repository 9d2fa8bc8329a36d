// OpenRouter adapter
// OpenRouter fronts many model vendors behind the OpenAI chat completions format;
// model names carry the vendor prefix, e.g. "openai/gpt-4o-mini".

use crate::llm::openai::OpenAIAdapter;
use crate::llm::{AppResult, LLMAdapter, LLMRequest, LLMResponse};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterAdapter {
    inner: OpenAIAdapter,
}

impl OpenRouterAdapter {
    pub fn new(api_key: &str) -> Self {
        Self {
            inner: OpenAIAdapter::new_with_api_base(api_key, OPENROUTER_API_BASE),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl LLMAdapter for OpenRouterAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.inner.create_chat_completion(request).await
    }

    async fn create_chat_completion_stream(&self, request: &LLMRequest) -> AppResult<BoxStream<'static, AppResult<String>>> {
        self.inner.create_chat_completion_stream(request).await
    }
}
