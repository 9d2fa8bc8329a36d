//! DuckDuckGo instant answer provider (no API key required, limited results)

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::{http_client, SearchError, SearchHit, WebSearchProvider};

const DUCKDUCKGO_API_BASE: &str = "https://api.duckduckgo.com";

pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    api_base: String,
}

impl DuckDuckGoProvider {
    pub fn new(timeout: Duration) -> Self {
        Self::with_api_base(timeout, DUCKDUCKGO_API_BASE)
    }

    pub fn with_api_base(timeout: Duration, api_base: &str) -> Self {
        Self {
            client: http_client(timeout),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        info!(query = %query, "Searching DuckDuckGo");

        let response = self
            .client
            .get(format!("{}/", self.api_base))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::RequestFailed(format!("DuckDuckGo returned {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let hits = parse_instant_answer(&body, max_results);
        debug!(count = hits.len(), "DuckDuckGo search completed");

        if hits.is_empty() {
            return Err(SearchError::NoResults);
        }
        Ok(hits)
    }
}

/// Extract the abstract and related topics (flattening topic groups).
fn parse_instant_answer(body: &Value, max_results: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();

    if let Some(abstract_text) = body.get("AbstractText").and_then(|v| v.as_str()) {
        if !abstract_text.is_empty() {
            hits.push(SearchHit {
                title: body
                    .get("Heading")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .unwrap_or("Result")
                    .to_string(),
                url: body
                    .get("AbstractURL")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                snippet: abstract_text.to_string(),
            });
        }
    }

    let topics = body
        .get("RelatedTopics")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);

    let flattened = topics.iter().flat_map(|topic| match topic.get("Topics").and_then(|t| t.as_array()) {
        Some(group) => group.iter().collect::<Vec<_>>(),
        None => vec![topic],
    });

    for topic in flattened {
        if hits.len() >= max_results {
            break;
        }
        if let Some(text) = topic.get("Text").and_then(|t| t.as_str()) {
            hits.push(SearchHit {
                title: text.chars().take(80).collect(),
                url: topic
                    .get("FirstURL")
                    .and_then(|u| u.as_str())
                    .unwrap_or("")
                    .to_string(),
                snippet: text.to_string(),
            });
        }
    }

    hits.truncate(max_results);
    hits
}
