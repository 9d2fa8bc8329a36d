//! Input Guardrails
//!
//! Two cheap agents screen the user's query before any research starts:
//! one rejects nonsense input (random strings, hashes), the other rejects
//! requests that are not research questions. Both run concurrently; either
//! tripwire aborts the run.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::runner::{Agent, AgentRunner};
use crate::config::LLMConfig;
use crate::types::{AppError, AppResult};

pub const INPUT_VALIDATION_GUARDRAIL: &str = "input_validation";
pub const RESEARCH_REQUEST_GUARDRAIL: &str = "research_request";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputValidationOutput {
    pub reasoning: String,
    pub is_valid_input: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOutput {
    pub reasoning: String,
    pub is_research_request: bool,
}

/// Outcome of a single guardrail check
#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailVerdict {
    pub guardrail: &'static str,
    pub reasoning: String,
    pub tripwire_triggered: bool,
}

pub struct GuardrailAgent;

impl GuardrailAgent {
    pub fn input_validation_agent(config: &LLMConfig) -> Agent {
        Agent::new(
            "Input guardrail check on reasonable input",
            "Check if the user is providing a reasonable request, e.g., the input is not a random string.",
            &config.default_model,
        )
        .with_temperature(0.0)
        .with_output_contract(r#"{"reasoning": "short explanation", "is_valid_input": true}"#)
    }

    pub fn research_request_agent(config: &LLMConfig) -> Agent {
        Agent::new(
            "Input guardrail check on research",
            "Check if the user is asking you to do research.",
            &config.default_model,
        )
        .with_temperature(0.0)
        .with_output_contract(r#"{"reasoning": "short explanation", "is_research_request": true}"#)
    }

    async fn validate_input(runner: &AgentRunner, config: &LLMConfig, input: &str) -> AppResult<GuardrailVerdict> {
        let output: InputValidationOutput = runner
            .run_structured(&Self::input_validation_agent(config), input)
            .await?;
        Ok(GuardrailVerdict {
            guardrail: INPUT_VALIDATION_GUARDRAIL,
            reasoning: output.reasoning,
            tripwire_triggered: !output.is_valid_input,
        })
    }

    async fn check_research_request(
        runner: &AgentRunner,
        config: &LLMConfig,
        input: &str,
    ) -> AppResult<GuardrailVerdict> {
        let output: ResearchOutput = runner
            .run_structured(&Self::research_request_agent(config), input)
            .await?;
        Ok(GuardrailVerdict {
            guardrail: RESEARCH_REQUEST_GUARDRAIL,
            reasoning: output.reasoning,
            tripwire_triggered: !output.is_research_request,
        })
    }

    /// Run every input guardrail; the first tripped one becomes the error.
    pub async fn check_input(runner: &AgentRunner, config: &LLMConfig, input: &str) -> AppResult<Vec<GuardrailVerdict>> {
        let (validation, research) = futures::try_join!(
            Self::validate_input(runner, config, input),
            Self::check_research_request(runner, config, input),
        )?;
        let verdicts = vec![validation, research];

        if let Some(tripped) = verdicts.iter().find(|v| v.tripwire_triggered) {
            warn!(guardrail = tripped.guardrail, reasoning = %tripped.reasoning, "Input guardrail tripped");
            return Err(AppError::GuardrailTripped {
                guardrail: tripped.guardrail.to_string(),
                reasoning: tripped.reasoning.clone(),
            });
        }

        info!("Input guardrails passed");
        Ok(verdicts)
    }
}
