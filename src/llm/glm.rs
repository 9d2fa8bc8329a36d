// GLM (Zhipu AI) adapter
// Documentation: https://docs.z.ai/guides/overview/quick-start
//
// There are TWO API endpoints:
// 1. Coding API (requires GLM Coding Plan subscription): https://api.z.ai/api/coding/paas/v4
// 2. General API: https://api.z.ai/api/paas/v4
// Both accept the OpenAI chat completions format, so requests go through OpenAIAdapter.

use crate::llm::openai::OpenAIAdapter;
use crate::llm::provider::LLMAdapter;
use crate::types::{AppResult, LLMRequest, LLMResponse};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

const GLM_CODING_API_BASE: &str = "https://api.z.ai/api/coding/paas/v4";
const GLM_GENERAL_API_BASE: &str = "https://api.z.ai/api/paas/v4";

pub struct GLMAdapter {
    inner: OpenAIAdapter,
}

impl GLMAdapter {
    /// General API endpoint, recommended for most users.
    pub fn new(api_key: &str) -> Self {
        Self::with_api_type(api_key, false)
    }

    /// Coding API endpoint.
    ///
    /// NOTE: This endpoint requires a GLM Coding Plan subscription!
    /// If you get "Unknown Model" errors, use `new()` instead.
    pub fn with_coding_api(api_key: &str) -> Self {
        Self::with_api_type(api_key, true)
    }

    fn with_api_type(api_key: &str, use_coding_api: bool) -> Self {
        let base = if use_coding_api {
            GLM_CODING_API_BASE
        } else {
            GLM_GENERAL_API_BASE
        };
        Self {
            inner: OpenAIAdapter::new_with_api_base(api_key, base),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.with_timeout(timeout);
        self
    }

    fn base_url(&self) -> &str {
        self.inner.api_base()
    }
}

#[async_trait]
impl LLMAdapter for GLMAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.inner.create_chat_completion(request).await
    }

    async fn create_chat_completion_stream(
        &self,
        request: &LLMRequest,
    ) -> AppResult<BoxStream<'static, AppResult<String>>> {
        self.inner.create_chat_completion_stream(request).await
    }
}
