use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;

    /// Stream content deltas. Adapters without streaming support keep the default.
    async fn create_chat_completion_stream(
        &self,
        _request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        Err(AppError::LLMApi("Streaming not supported by this adapter".to_string()))
    }
}

/// Configuration for the LLM provider (named to avoid a clash with the `LLMProvider` enum)
#[derive(Debug, Clone)]
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub timeout: Duration,
}

impl LLMProviderConfig {
    pub fn from_config(config: &crate::config::LLMConfig) -> AppResult<Self> {
        let api_key = config.active_api_key().ok_or_else(|| {
            AppError::Config(format!("No API key configured for provider '{}'", config.provider))
        })?;

        Ok(Self {
            name: config.provider.clone(),
            api_key,
            api_base: config.api_base.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[derive(Clone)]
pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider_name: String,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        use crate::llm::{glm::GLMAdapter, groq::GroqAdapter, openai::OpenAIAdapter, openrouter::OpenRouterAdapter};

        let kind = LLMProvider::from_name(&provider.name)
            .ok_or_else(|| AppError::Config(format!("Unsupported provider: {}", provider.name)))?;
        let key = provider.api_key.as_str();

        // An explicit base URL always wins; every supported provider speaks the same dialect.
        let adapter: Arc<dyn LLMAdapter> = match (&provider.api_base, kind) {
            (Some(base), _) => Arc::new(OpenAIAdapter::new_with_api_base(key, base).with_timeout(provider.timeout)),
            (None, LLMProvider::OpenAI) => Arc::new(OpenAIAdapter::new(key).with_timeout(provider.timeout)),
            (None, LLMProvider::Groq) => Arc::new(GroqAdapter::new(key).with_timeout(provider.timeout)),
            (None, LLMProvider::OpenRouter) => Arc::new(OpenRouterAdapter::new(key).with_timeout(provider.timeout)),
            (None, LLMProvider::GLM) => Arc::new(GLMAdapter::new(key).with_timeout(provider.timeout)),
            (None, LLMProvider::GLMCoding) => Arc::new(GLMAdapter::with_coding_api(key).with_timeout(provider.timeout)),
        };

        Ok(Self {
            adapter,
            provider_name: kind.to_string(),
        })
    }

    /// Wrap an existing adapter, e.g. a scripted one in tests.
    pub fn from_adapter(name: impl Into<String>, adapter: Arc<dyn LLMAdapter>) -> Self {
        Self {
            adapter,
            provider_name: name.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.adapter.create_chat_completion(request).await
    }

    pub async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        self.adapter.create_chat_completion_stream(request).await
    }
}
