// Type definitions shared by the LLM layer and the agents

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LLMProvider {
    OpenAI,
    Groq,
    OpenRouter,
    GLM,
    GLMCoding,
}

impl LLMProvider {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "openai" => Some(LLMProvider::OpenAI),
            "groq" => Some(LLMProvider::Groq),
            "openrouter" => Some(LLMProvider::OpenRouter),
            "glm" | "glm-general" => Some(LLMProvider::GLM),
            "glm-coding" => Some(LLMProvider::GLMCoding),
            _ => None,
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::Groq => write!(f, "groq"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::GLM => write!(f, "glm"),
            LLMProvider::GLMCoding => write!(f, "glm-coding"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<LLMMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMMessage {
    pub role: String, // "user", "assistant", "system"
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("Search error: {0}")]
    Search(#[from] crate::search::SearchError),

    #[error("Guardrail '{guardrail}' tripped: {reasoning}")]
    GuardrailTripped { guardrail: String, reasoning: String },

    #[error("Failed to parse agent output: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Only LLM transport/provider failures are retried; parse errors and tripped guardrails are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::LLMApi(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for AppError {
    fn from(e: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;
        match e {
            OpenAIError::ApiError(api) => AppError::LLMApi(format!("API error: {}", api.message)),
            OpenAIError::InvalidArgument(message) => AppError::Internal(format!("Invalid LLM request: {}", message)),
            other => AppError::LLMApi(other.to_string()),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names_round_trip() {
        for provider in [
            LLMProvider::OpenAI,
            LLMProvider::Groq,
            LLMProvider::OpenRouter,
            LLMProvider::GLM,
            LLMProvider::GLMCoding,
        ] {
            assert_eq!(LLMProvider::from_name(&provider.to_string()), Some(provider));
        }
        assert_eq!(LLMProvider::from_name(" OpenAI "), Some(LLMProvider::OpenAI));
        assert_eq!(LLMProvider::from_name("glm-general"), Some(LLMProvider::GLM));
        assert_eq!(LLMProvider::from_name("anthropic"), None);
    }

    #[test]
    fn test_guardrail_error_message() {
        let err = AppError::GuardrailTripped {
            guardrail: "research_request".to_string(),
            reasoning: "greeting only".to_string(),
        };
        assert_eq!(err.to_string(), "Guardrail 'research_request' tripped: greeting only");
        assert!(!err.is_retryable());
        assert!(AppError::LLMApi("503".to_string()).is_retryable());
    }
}
