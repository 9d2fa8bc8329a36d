//! Query Reformulation Agent
//!
//! Expands a terse user query into a fuller research question before planning.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::runner::{Agent, AgentRunner};
use crate::config::LLMConfig;
use crate::types::{AppError, AppResult};

const INSTRUCTIONS: &str = "You are a helpful research assistant. Analyze the provided search query, \
identify its key concepts, implicit intentions, and potential knowledge gaps, \
then generate an expanded version of the query.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutput {
    pub query: String,
}

pub struct QueryReformulationAgent;

impl QueryReformulationAgent {
    pub fn agent(config: &LLMConfig) -> Agent {
        Agent::new("QueryReformulationAgent", INSTRUCTIONS, &config.default_model)
            .with_temperature(0.3)
            .with_output_contract(r#"{"query": "the expanded research query"}"#)
    }

    pub fn input(query: &str) -> String {
        format!("Query: {}", query)
    }

    pub async fn reformulate(runner: &AgentRunner, config: &LLMConfig, query: &str) -> AppResult<String> {
        let output: QueryOutput = runner
            .run_structured(&Self::agent(config), &Self::input(query))
            .await?;

        let reformulated = output.query.trim().to_string();
        if reformulated.is_empty() {
            return Err(AppError::Parse("Reformulation returned an empty query".to_string()));
        }

        info!(original = %query, reformulated = %reformulated, "Query reformulated");
        Ok(reformulated)
    }
}
