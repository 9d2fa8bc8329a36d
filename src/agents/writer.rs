//! Writer Agent
//!
//! Synthesizes the accepted search summaries into a long-form markdown report,
//! a short summary and follow-up questions. The report is long enough that the
//! manager streams it and shows progress while the model writes.

use serde::{Deserialize, Serialize};

use super::runner::{Agent, AgentRunner, RunStream};
use crate::config::LLMConfig;
use crate::types::AppResult;

const INSTRUCTIONS: &str = "You are a senior researcher tasked with writing a cohesive report for a research query. \
You will be provided with the original query and some initial research done by a research assistant.\n\
You should first come up with an outline for the report that describes the structure and flow of the report. \
Then, generate the report and return that as your final output.\n\
The final output should be in markdown format, and it should be lengthy and detailed. \
Aim for 5-10 pages of content, at least 1000 words.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    /// A short 2-3 sentence summary of the findings
    pub short_summary: String,
    /// The final report, in markdown
    pub markdown_report: String,
    /// Suggested topics to research further
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

pub struct WriterAgent;

impl WriterAgent {
    pub fn agent(config: &LLMConfig) -> Agent {
        Agent::new("WriterAgent", INSTRUCTIONS, &config.writer_model)
            .with_temperature(0.7)
            .with_output_contract(
                r##"{"short_summary": "2-3 sentence summary", "markdown_report": "# Title\n...", "follow_up_questions": ["question"]}"##,
            )
    }

    pub fn input(query: &str, search_results: &[String]) -> String {
        let summaries = if search_results.is_empty() {
            "(no search results were accepted)".to_string()
        } else {
            search_results
                .iter()
                .enumerate()
                .map(|(i, result)| format!("{}. {}", i + 1, result))
                .collect::<Vec<_>>()
                .join("\n\n")
        };
        format!("Original query: {}\nSummarized search results:\n{}", query, summaries)
    }

    pub async fn write_streamed(
        runner: &AgentRunner,
        config: &LLMConfig,
        query: &str,
        search_results: &[String],
    ) -> AppResult<RunStream> {
        runner
            .run_streamed(&Self::agent(config), &Self::input(query, search_results))
            .await
    }

    /// Non-streaming write, used when a streamed run breaks off midway.
    pub async fn write(runner: &AgentRunner, config: &LLMConfig, query: &str, search_results: &[String]) -> AppResult<ReportData> {
        runner
            .run_structured(&Self::agent(config), &Self::input(query, search_results))
            .await
    }
}
