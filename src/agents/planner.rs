//! Planner Agent
//!
//! Turns the reformulated query into a list of web searches, each with the
//! reason it helps answer the query.
//!
//! ## Plan Shape
//!
//! ```json
//! {
//!   "searches": [
//!     { "reason": "why this search matters", "query": "the search term" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::runner::{Agent, AgentRunner};
use crate::config::LLMConfig;
use crate::types::AppResult;

pub const MIN_SEARCHES: usize = 5;
pub const MAX_SEARCHES: usize = 20;

const INSTRUCTIONS: &str = "You are a helpful research assistant. Given a query, come up with a set of web searches \
to perform to best answer the query. Output between 5 and 20 terms to query for. \
Each search must have a short reason explaining why it is important to the query.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchItem {
    /// Why this search is important to the query
    pub reason: String,
    /// The search term to use for the web search
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSearchPlan {
    #[serde(default)]
    pub searches: Vec<WebSearchItem>,
}

impl WebSearchPlan {
    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }

    /// Drop blank queries and keep at most `max` searches, in plan order.
    pub fn capped(mut self, max: usize) -> Self {
        self.searches.retain(|item| !item.query.trim().is_empty());
        if self.searches.len() > max {
            warn!(planned = self.searches.len(), max, "Search plan exceeds limit, truncating");
            self.searches.truncate(max);
        }
        self
    }
}

pub struct PlannerAgent;

impl PlannerAgent {
    pub fn agent(config: &LLMConfig) -> Agent {
        Agent::new("PlannerAgent", INSTRUCTIONS, &config.planner_model)
            .with_temperature(0.4)
            .with_output_contract(
                r#"{"searches": [{"reason": "why this search is important", "query": "search term"}]}"#,
            )
    }

    pub async fn plan(runner: &AgentRunner, config: &LLMConfig, query: &str, max_searches: usize) -> AppResult<WebSearchPlan> {
        let plan: WebSearchPlan = runner
            .run_structured(&Self::agent(config), &format!("Query: {}", query))
            .await?;

        if plan.len() < MIN_SEARCHES {
            warn!(planned = plan.len(), "Planner returned fewer searches than requested");
        }

        let plan = plan.capped(max_searches);
        info!(searches = plan.len(), "Search plan ready");
        Ok(plan)
    }
}
