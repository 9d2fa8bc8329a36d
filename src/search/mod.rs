//! Search Module
//!
//! Web search backends behind a single [`WebSearchProvider`] trait:
//! - DuckDuckGo instant answers (default, no API key)
//! - DuckDuckGo HTML results, scraped and stripped to text
//! - Google web search through SerpAPI
//!
//! The search agent always calls the configured backend before summarising,
//! so the backend is the only source of facts a summary may contain.

pub mod duckduckgo;
pub mod html;
pub mod serpapi;

pub use duckduckgo::DuckDuckGoProvider;
pub use html::DuckDuckGoHtmlProvider;
pub use serpapi::SerpApiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::SearchConfig;

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No results found for query")]
    NoResults,

    #[error("Unknown search provider: {0}")]
    UnknownProvider(String),
}

/// A single web search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Render hits as the tool output the search agent summarises.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let mut entry = format!("[{}] {}", i + 1, hit.title);
            if !hit.url.is_empty() {
                entry.push_str(&format!("\nURL: {}", hit.url));
            }
            if !hit.snippet.is_empty() {
                entry.push_str(&format!("\n{}", hit.snippet));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("Mozilla/5.0 (compatible; deep-research/0.1)")
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Build the configured search backend.
pub fn build_provider(config: &SearchConfig) -> Result<Arc<dyn WebSearchProvider>, SearchError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    let provider: Arc<dyn WebSearchProvider> = match config.provider.to_lowercase().as_str() {
        "duckduckgo" | "ddg" => Arc::new(DuckDuckGoProvider::new(timeout)),
        "duckduckgo-html" | "html" => {
            Arc::new(DuckDuckGoHtmlProvider::new(timeout).with_fetch_pages(config.fetch_pages))
        }
        "serpapi" => Arc::new(SerpApiClient::from_config(config).ok_or(SearchError::NoApiKey)?),
        other => return Err(SearchError::UnknownProvider(other.to_string())),
    };

    Ok(provider)
}
