use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::types::LLMProvider;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub research: ResearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub openai_api_key: String,
    pub groq_api_key: String,
    pub openrouter_api_key: String,
    pub glm_api_key: String,
    pub api_base: Option<String>,
    pub default_model: String,
    pub planner_model: String,
    pub writer_model: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl LLMConfig {
    /// API key for the configured provider, if one is set.
    pub fn active_api_key(&self) -> Option<String> {
        let key = match LLMProvider::from_name(&self.provider)? {
            LLMProvider::OpenAI => &self.openai_api_key,
            LLMProvider::Groq => &self.groq_api_key,
            LLMProvider::OpenRouter => &self.openrouter_api_key,
            LLMProvider::GLM | LLMProvider::GLMCoding => &self.glm_api_key,
        };
        if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub provider: String,
    pub serpapi_key: String,
    pub max_results: usize,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub fetch_pages: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchConfig {
    pub results_dir: PathBuf,
    pub max_searches: usize,
    pub writer_update_interval_secs: u64,
    pub guardrails_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_vars(|key| vars.get(key).cloned())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let default_model = var("LLM_MODEL", "gpt-4o-mini");
        let provider = var("LLM_PROVIDER", "openai");
        if LLMProvider::from_name(&provider).is_none() {
            anyhow::bail!("Unsupported LLM_PROVIDER: {}", provider);
        }

        Ok(Self {
            llm: LLMConfig {
                provider,
                openai_api_key: var("OPENAI_API_KEY", ""),
                groq_api_key: var("GROQ_API_KEY", ""),
                openrouter_api_key: var("OPENROUTER_API_KEY", ""),
                glm_api_key: var("GLM_API_KEY", ""),
                api_base: lookup("LLM_API_BASE").filter(|s| !s.is_empty()),
                planner_model: var("PLANNER_MODEL", &default_model),
                writer_model: var("WRITER_MODEL", &default_model),
                default_model,
                max_retries: parse_var(&lookup, "LLM_MAX_RETRIES", "3")?,
                timeout_secs: parse_var(&lookup, "LLM_TIMEOUT_SECS", "120")?,
            },
            search: SearchConfig {
                provider: var("SEARCH_PROVIDER", "duckduckgo"),
                serpapi_key: var("SERPAPI_API_KEY", ""),
                max_results: parse_var(&lookup, "SEARCH_MAX_RESULTS", "5")?,
                concurrency: parse_var(&lookup, "SEARCH_CONCURRENCY", "0")?,
                timeout_secs: parse_var(&lookup, "SEARCH_TIMEOUT_SECS", "15")?,
                fetch_pages: parse_var(&lookup, "SEARCH_FETCH_PAGES", "0")?,
            },
            research: ResearchConfig {
                results_dir: PathBuf::from(var("RESULTS_DIR", "results")),
                max_searches: parse_var(&lookup, "MAX_SEARCHES", "20")?,
                writer_update_interval_secs: parse_var(&lookup, "WRITER_UPDATE_INTERVAL_SECS", "5")?,
                guardrails_enabled: parse_var(&lookup, "GUARDRAILS_ENABLED", "true")?,
            },
            logging: LoggingConfig {
                log_dir: PathBuf::from(var("LOG_DIR", "logs")),
            },
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
}
