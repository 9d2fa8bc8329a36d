//! Search Agent
//!
//! Executes one planned search and summarises the hits. The web search is
//! always run before the model sees the request, so the summary can only be
//! built from what the backend returned.
//!
//! DuckDuckGo rate limits often leave a search with thin or no results, and
//! the model will happily invent a summary anyway. A second agent reads each
//! summary and decides whether it reflects a successful search; rejected
//! summaries never reach the writer.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::planner::WebSearchItem;
use super::runner::{Agent, AgentRunner};
use crate::config::LLMConfig;
use crate::search::{format_hits, WebSearchProvider};
use crate::types::AppResult;

const SEARCH_INSTRUCTIONS: &str = "You are a research assistant. Given a search term and the results of a web \
search for that term, produce a concise summary of the results. The summary must be 2-3 paragraphs and less \
than 300 words. Capture the main points. Write succinctly, no need to have complete sentences or good grammar. \
This will be consumed by someone synthesizing a report, so it is vital you capture the essence and ignore any \
fluff. Do not include any additional commentary other than the summary itself.";

const VALIDATION_INSTRUCTIONS: &str = "You review the output of a web search assistant. Decide whether the text \
is a genuine summary of search results. Mark the search as unsuccessful if the text says no results were found, \
apologises, asks for clarification, or only restates the search term without concrete findings.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchValidationOutput {
    pub reasoning: String,
    pub successful_search: bool,
}

/// Result of a single search item after validation
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Accepted(String),
    Rejected { reasoning: String },
}

pub struct SearchAgent;

impl SearchAgent {
    pub fn agent(config: &LLMConfig) -> Agent {
        Agent::new("Search agent", SEARCH_INSTRUCTIONS, &config.default_model).with_max_tokens(600)
    }

    pub fn input(item: &WebSearchItem) -> String {
        format!("Search term: {}\nReason for searching: {}", item.query, item.reason)
    }

    /// Run the web search for `item`, then summarise the hits.
    pub async fn search(
        runner: &AgentRunner,
        config: &LLMConfig,
        provider: &dyn WebSearchProvider,
        max_results: usize,
        item: &WebSearchItem,
    ) -> AppResult<String> {
        let hits = provider.search(&item.query, max_results).await?;
        debug!(provider = provider.name(), query = %item.query, hits = hits.len(), "Web search returned");

        let input = format!("{}\n\nWeb search results:\n{}", Self::input(item), format_hits(&hits));
        let summary = runner.run_text(&Self::agent(config), &input).await?;
        Ok(summary.trim().to_string())
    }
}

pub struct SearchValidationAgent;

impl SearchValidationAgent {
    pub fn agent(config: &LLMConfig) -> Agent {
        Agent::new("Search output validation agent", VALIDATION_INSTRUCTIONS, &config.default_model)
            .with_temperature(0.0)
            .with_output_contract(r#"{"reasoning": "short explanation", "successful_search": true}"#)
    }

    pub async fn validate(runner: &AgentRunner, config: &LLMConfig, summary: &str) -> AppResult<SearchValidationOutput> {
        runner.run_structured(&Self::agent(config), summary).await
    }
}

/// Search, then validate. Errors from either stage propagate to the caller.
pub async fn search_and_validate(
    runner: &AgentRunner,
    config: &LLMConfig,
    provider: &dyn WebSearchProvider,
    max_results: usize,
    item: &WebSearchItem,
) -> AppResult<SearchOutcome> {
    let summary = SearchAgent::search(runner, config, provider, max_results, item).await?;
    let validation = SearchValidationAgent::validate(runner, config, &summary).await?;

    if validation.successful_search {
        info!(query = %item.query, "Search result accepted");
        Ok(SearchOutcome::Accepted(summary))
    } else {
        warn!(query = %item.query, reasoning = %validation.reasoning, "The search results were unsuccessful");
        Ok(SearchOutcome::Rejected {
            reasoning: validation.reasoning,
        })
    }
}
