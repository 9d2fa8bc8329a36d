//! SerpAPI Client
//!
//! Google web search through SerpAPI. Used when a SerpAPI key is configured and
//! DuckDuckGo's rate limits make its results too thin.
//!
//! ## Result assembly
//!
//! 1. **Answer box** (if present): Google's direct answer, placed first
//! 2. **Organic results**: title, link and snippet, in ranking order

use async_trait::async_trait;
use serde_json::Value;
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{SearchError, SearchHit, WebSearchProvider};

/// SerpAPI client for web search
pub struct SerpApiClient {
    api_key: String,
    max_results: usize,
}

impl SerpApiClient {
    /// Create a new SerpAPI client
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            max_results: 10,
        }
    }

    /// Configure client from config
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.is_empty() {
            return None;
        }

        Some(Self::new(config.serpapi_key.clone()).with_max_results(config.max_results))
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Search Google and return the raw SerpAPI JSON
    async fn search_raw(&self, query: &str, max_results: usize) -> Result<Value, SearchError> {
        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), "google".to_string());
        params.insert("q".to_string(), query.to_string());
        params.insert("hl".to_string(), "en".to_string());
        params.insert("num".to_string(), max_results.to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());

        let results = search
            .json()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
            return Err(SearchError::RequestFailed(error.to_string()));
        }

        debug!("Raw SerpAPI response received");
        Ok(results)
    }
}

#[async_trait]
impl WebSearchProvider for SerpApiClient {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let limit = max_results.min(self.max_results.max(1));
        info!(query = %query, limit, "Searching Google via SerpAPI");

        let results = self.search_raw(query, limit).await?;
        let hits = parse_google_results(&results, limit)?;

        info!(count = hits.len(), "SerpAPI search completed");
        Ok(hits)
    }
}

/// Turn a SerpAPI Google response into hits
fn parse_google_results(results: &Value, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
    let mut hits = Vec::new();

    if let Some(answer) = results.get("answer_box") {
        let snippet = answer
            .get("answer")
            .or_else(|| answer.get("snippet"))
            .and_then(|v| v.as_str());
        if let Some(snippet) = snippet {
            hits.push(SearchHit {
                title: answer
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Answer")
                    .to_string(),
                url: answer
                    .get("link")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                snippet: snippet.to_string(),
            });
        }
    }

    let organic = match results.get("organic_results") {
        Some(value) => value
            .as_array()
            .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?
            .as_slice(),
        None => &[],
    };

    for result in organic {
        if hits.len() >= max_results {
            break;
        }

        let title = result
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled")
            .to_string();

        let url = result
            .get("link")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let snippet = result
            .get("snippet")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        hits.push(SearchHit { title, url, snippet });
    }

    if hits.is_empty() {
        return Err(SearchError::NoResults);
    }
    Ok(hits)
}
