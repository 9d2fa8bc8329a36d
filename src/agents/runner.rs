//! Agent Runner
//!
//! An [`Agent`] is just instructions, a model and an optional JSON output
//! contract. The runner turns an agent plus an input string into an LLM
//! request, retries transient failures, and decodes structured replies.

use futures::stream::{self, BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::llm::LLM;
use crate::types::{AppError, AppResult, LLMMessage, LLMRequest};
use crate::utils::retry::{with_retry, RetryPolicy};

/// Definition of a single agent
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: &'static str,
    pub instructions: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// JSON shape the reply must follow, shown verbatim to the model.
    pub output_contract: Option<&'static str>,
}

impl Agent {
    pub fn new(name: &'static str, instructions: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name,
            instructions: instructions.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            output_contract: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_output_contract(mut self, contract: &'static str) -> Self {
        self.output_contract = Some(contract);
        self
    }

    pub fn system_instruction(&self) -> String {
        match self.output_contract {
            Some(contract) => format!(
                "{}\n\nOUTPUT FORMAT (respond with ONLY valid JSON, no commentary):\n{}",
                self.instructions, contract
            ),
            None => self.instructions.clone(),
        }
    }

    fn request(&self, input: &str) -> LLMRequest {
        LLMRequest {
            model: self.model.clone(),
            messages: vec![LLMMessage::user(input)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system_instruction: Some(self.system_instruction()),
        }
    }
}

pub struct AgentRunner {
    llm: LLM,
    retry: RetryPolicy,
}

impl AgentRunner {
    pub fn new(llm: LLM, retry: RetryPolicy) -> Self {
        Self { llm, retry }
    }

    pub fn provider_name(&self) -> &str {
        self.llm.provider_name()
    }

    /// Run an agent and return its raw text reply.
    pub async fn run_text(&self, agent: &Agent, input: &str) -> AppResult<String> {
        let request = agent.request(input);
        debug!(agent = agent.name, model = %agent.model, input_len = input.len(), "Running agent");

        let response = with_retry(self.retry, AppError::is_retryable, || {
            self.llm.create_chat_completion(&request)
        })
        .await?;

        info!(
            agent = agent.name,
            output_len = response.content.len(),
            total_tokens = response.usage.total_tokens,
            "Agent finished"
        );
        Ok(response.content)
    }

    /// Run an agent whose reply must decode into `T`.
    pub async fn run_structured<T: DeserializeOwned>(&self, agent: &Agent, input: &str) -> AppResult<T> {
        let text = self.run_text(agent, input).await?;
        parse_json_output(&text).map_err(|e| {
            warn!(agent = agent.name, error = %e, "Agent returned malformed output");
            e
        })
    }

    /// Run an agent and consume its reply as a stream of text deltas.
    ///
    /// Adapters without streaming support fall back to a normal completion
    /// delivered as a single event.
    pub async fn run_streamed(&self, agent: &Agent, input: &str) -> AppResult<RunStream> {
        let request = agent.request(input);
        info!(agent = agent.name, model = %agent.model, "Starting streamed agent run");

        // Not retried: the fallback below already retries as a plain completion.
        match self.llm.create_chat_completion_stream(&request).await {
            Ok(inner) => Ok(RunStream::new(inner)),
            Err(e) => {
                warn!(agent = agent.name, error = %e, "Streaming not available, falling back to standard completion");
                let text = self.run_text(agent, input).await?;
                Ok(RunStream::from_text(text))
            }
        }
    }
}

/// Events surfaced while an agent streams its reply
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    TextDelta(String),
}

/// In-flight streamed run; accumulates the reply as events are consumed.
pub struct RunStream {
    inner: BoxStream<'static, AppResult<String>>,
    accumulated: String,
    events_seen: usize,
}

impl RunStream {
    pub fn new(inner: BoxStream<'static, AppResult<String>>) -> Self {
        Self {
            inner,
            accumulated: String::new(),
            events_seen: 0,
        }
    }

    pub fn from_text(text: String) -> Self {
        Self::new(stream::once(async move { Ok(text) }).boxed())
    }

    pub async fn next_event(&mut self) -> Option<AppResult<StreamEvent>> {
        let item = self.inner.next().await?;
        Some(item.map(|delta| {
            self.accumulated.push_str(&delta);
            self.events_seen += 1;
            StreamEvent::TextDelta(delta)
        }))
    }

    pub fn events_seen(&self) -> usize {
        self.events_seen
    }

    pub fn final_output(&self) -> &str {
        &self.accumulated
    }

    pub fn final_output_as<T: DeserializeOwned>(&self) -> AppResult<T> {
        parse_json_output(&self.accumulated)
    }
}

/// Pull the JSON payload out of a reply that may wrap it in prose or code fences.
///
/// String values may themselves contain fences (a markdown report with a code
/// block), so a fence is only unwrapped when it opens the reply, and only the
/// last closing fence ends it.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();
    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return trimmed;
    }

    if let Some(after_fence) = trimmed.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) on the opening line.
        let body = after_fence.split_once('\n').map_or("", |(_, rest)| rest);
        let body = match body.rfind("```") {
            Some(end) => &body[..end],
            None => body,
        };
        return body.trim();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

pub fn parse_json_output<T: DeserializeOwned>(response: &str) -> AppResult<T> {
    let json_str = extract_json(response);
    serde_json::from_str(json_str).map_err(|e| AppError::Parse(format!("{} in {:?}", e, preview(json_str))))
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        query: String,
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(extract_json("Sure! {\"a\":1} Hope that helps."), "{\"a\":1}");
        assert_eq!(extract_json("  plain  "), "plain");
    }

    #[derive(Debug, Deserialize)]
    struct Report {
        short_summary: String,
        markdown_report: String,
    }

    const REPORT_WITH_CODE: &str = r##"{"short_summary": "s", "markdown_report": "# Tokio\n\n```rust\nfn main() {}\n```\n"}"##;

    #[test]
    fn test_report_containing_code_block_parses_bare() {
        let report: Report = parse_json_output(REPORT_WITH_CODE).unwrap();
        assert_eq!(report.short_summary, "s");
        assert!(report.markdown_report.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn test_report_containing_code_block_parses_fenced() {
        let fenced = format!("```json\n{}\n```", REPORT_WITH_CODE);
        let report: Report = parse_json_output(&fenced).unwrap();
        assert!(report.markdown_report.ends_with("```\n"));

        let with_prose = format!("Here is the report:\n```json\n{}\n```\nLet me know.", REPORT_WITH_CODE);
        let report: Report = parse_json_output(&with_prose).unwrap();
        assert!(report.markdown_report.starts_with("# Tokio"));
    }

    #[test]
    fn test_parse_json_output() {
        let parsed: Answer = parse_json_output("```json\n{\"query\": \"expanded\"}\n```").unwrap();
        assert_eq!(parsed.query, "expanded");

        let err = parse_json_output::<Answer>("not json").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[test]
    fn test_system_instruction_includes_contract() {
        let agent = Agent::new("test", "Do the thing.", "gpt-4o-mini").with_output_contract("{\"query\": \"...\"}");
        let instruction = agent.system_instruction();
        assert!(instruction.starts_with("Do the thing."));
        assert!(instruction.contains("ONLY valid JSON"));
        assert!(instruction.ends_with("{\"query\": \"...\"}"));

        let plain = Agent::new("plain", "Just text.", "gpt-4o-mini");
        assert_eq!(plain.system_instruction(), "Just text.");
    }

    #[tokio::test]
    async fn test_run_stream_accumulates() {
        let deltas = vec![Ok("{\"query\":".to_string()), Ok(" \"streamed\"}".to_string())];
        let mut run = RunStream::new(stream::iter(deltas).boxed());

        let mut count = 0;
        while let Some(event) = run.next_event().await {
            event.unwrap();
            count += 1;
        }

        assert_eq!(count, 2);
        assert_eq!(run.events_seen(), 2);
        let parsed: Answer = run.final_output_as().unwrap();
        assert_eq!(parsed.query, "streamed");
    }

    #[tokio::test]
    async fn test_run_stream_from_text() {
        let mut run = RunStream::from_text("hello".to_string());
        assert_eq!(
            run.next_event().await.unwrap().unwrap(),
            StreamEvent::TextDelta("hello".to_string())
        );
        assert!(run.next_event().await.is_none());
        assert_eq!(run.final_output(), "hello");
    }
}
