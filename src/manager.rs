//! Research Manager
//!
//! Drives one research run end to end:
//!
//! ```text
//! guardrails → reformulate → plan → search + validate (parallel) → write (streamed) → save
//! ```
//!
//! Searches run concurrently and are handled in the order they finish, so the
//! progress line counts completions rather than plan positions. Accepted
//! summaries are saved under their plan index and passed to the writer in
//! completion order.

use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{
    search_and_validate, AgentRunner, GuardrailAgent, PlannerAgent, QueryReformulationAgent, ReportData,
    SearchOutcome, WebSearchPlan, WriterAgent,
};
use crate::config::Config;
use crate::printer::{tick_interval, Printer};
use crate::search::WebSearchProvider;
use crate::storage::{search_result_file_name, ResultsStore, SavedReport, SearchManifestEntry, SearchStatus};
use crate::types::AppResult;

/// Progress messages cycled while the report streams in.
pub const WRITER_UPDATE_MESSAGES: &[&str] = &[
    "Thinking about report...",
    "Planning report structure...",
    "Writing outline...",
    "Creating sections...",
    "Cleaning up formatting...",
    "Finalizing report...",
    "Finishing report...",
];

/// Hands out the next message once more than `interval` has passed since the
/// previous one. Each message is shown at most once.
#[derive(Debug, Clone)]
pub struct ProgressCycle {
    messages: &'static [&'static str],
    interval: Duration,
    last_update: Instant,
    next: usize,
}

impl ProgressCycle {
    pub fn new(messages: &'static [&'static str], interval: Duration, started: Instant) -> Self {
        Self {
            messages,
            interval,
            last_update: started,
            next: 0,
        }
    }

    pub fn tick(&mut self, now: Instant) -> Option<&'static str> {
        if self.next >= self.messages.len() || now.duration_since(self.last_update) <= self.interval {
            return None;
        }
        let message = self.messages[self.next];
        self.next += 1;
        self.last_update = now;
        Some(message)
    }

    pub fn shown(&self) -> usize {
        self.next
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub trace_id: String,
    pub reformulated_query: String,
    pub plan: WebSearchPlan,
    pub search_results: Vec<String>,
    pub report: ReportData,
    pub run_dir: PathBuf,
    pub saved: SavedReport,
}

pub struct ResearchManager {
    config: Config,
    runner: AgentRunner,
    search: Arc<dyn WebSearchProvider>,
    printer: Printer,
    trace_id: String,
}

impl ResearchManager {
    pub fn new(config: Config, runner: AgentRunner, search: Arc<dyn WebSearchProvider>, printer: Printer) -> Self {
        Self {
            config,
            runner,
            search,
            printer,
            trace_id: format!("trace_{}", Uuid::new_v4().simple()),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub async fn run(&mut self, query: &str) -> AppResult<ResearchOutcome> {
        info!(
            trace_id = %self.trace_id,
            provider = self.runner.provider_name(),
            query = %query,
            "Starting research run"
        );
        let result = self.run_pipeline(query).await;
        self.printer.end();

        match &result {
            Ok(outcome) => info!(trace_id = %self.trace_id, run_dir = %outcome.run_dir.display(), "Research run finished"),
            Err(e) => warn!(trace_id = %self.trace_id, error = %e, "Research run failed"),
        }
        result
    }

    async fn run_pipeline(&mut self, query: &str) -> AppResult<ResearchOutcome> {
        self.printer
            .update_item("trace_id", format!("Trace ID: {}", self.trace_id), true, true);
        self.printer.update_item("starting", "Starting research...", true, true);

        let store = ResultsStore::create(&self.config.research.results_dir, &self.trace_id).await?;

        if self.config.research.guardrails_enabled {
            self.check_guardrails(query).await?;
        }

        let reformulated_query = self.reformulate_query(query).await?;
        let plan = self.plan_searches(&reformulated_query).await?;
        store.save_plan(query, &reformulated_query, &plan).await?;

        let search_results = self.perform_searches(&plan, &store).await?;
        let report = self.write_report(&reformulated_query, &search_results).await?;

        self.printer
            .update_item("saving", "Saving final report and follow-up questions...", false, false);
        let saved = store.save_final_report(&report).await?;
        self.printer.update_item(
            "saving",
            format!(
                "Report saved to: {}\nFollow-up questions saved to: {}",
                saved.report_path.display(),
                saved.questions_path.display()
            ),
            true,
            false,
        );

        self.printer.update_item(
            "final_report",
            format!("Report summary\n\n{}", report.short_summary),
            true,
            false,
        );

        Ok(ResearchOutcome {
            trace_id: self.trace_id.clone(),
            reformulated_query,
            plan,
            search_results,
            report,
            run_dir: store.run_dir().to_path_buf(),
            saved,
        })
    }

    async fn check_guardrails(&mut self, query: &str) -> AppResult<()> {
        self.printer.update_item("guardrails", "Checking the request...", false, false);
        match GuardrailAgent::check_input(&self.runner, &self.config.llm, query).await {
            Ok(_) => {
                self.printer.update_item("guardrails", "Request accepted", true, false);
                Ok(())
            }
            Err(e) => {
                self.printer
                    .update_item("guardrails", format!("Request rejected: {}", e), true, true);
                Err(e)
            }
        }
    }

    async fn reformulate_query(&mut self, query: &str) -> AppResult<String> {
        self.printer.update_item(
            "query_reformulation",
            format!("Reformulating the query: {}.", query),
            false,
            false,
        );
        let reformulated = QueryReformulationAgent::reformulate(&self.runner, &self.config.llm, query).await?;
        self.printer.update_item(
            "query_reformulation",
            format!("Reformulated query: {}", reformulated),
            true,
            false,
        );
        Ok(reformulated)
    }

    async fn plan_searches(&mut self, query: &str) -> AppResult<WebSearchPlan> {
        self.printer.update_item("planning", "Planning searches...", false, false);
        let plan = PlannerAgent::plan(
            &self.runner,
            &self.config.llm,
            query,
            self.config.research.max_searches,
        )
        .await?;
        self.printer
            .update_item("planning", format!("Will perform {} searches", plan.len()), true, false);
        Ok(plan)
    }

    async fn perform_searches(&mut self, plan: &WebSearchPlan, store: &ResultsStore) -> AppResult<Vec<String>> {
        self.printer.update_item("searching", "Searching...", false, false);

        let total = plan.len();
        let limit = match self.config.search.concurrency {
            0 => total.max(1),
            n => n,
        };

        let runner = &self.runner;
        let llm_config = &self.config.llm;
        let provider = self.search.as_ref();
        let max_results = self.config.search.max_results;

        let mut completions = stream::iter(plan.searches.iter().enumerate())
            .map(move |(index, item)| async move {
                let outcome = search_and_validate(runner, llm_config, provider, max_results, item).await;
                (index, outcome)
            })
            .buffer_unordered(limit);

        let mut results = Vec::new();
        let mut manifest = Vec::with_capacity(total);
        let mut completed = 0;

        let mut ticker = tick_interval();
        loop {
            let next = tokio::select! {
                next = completions.next() => next,
                _ = ticker.tick() => {
                    self.printer.tick();
                    continue;
                }
            };
            let Some((index, outcome)) = next else {
                break;
            };
            completed += 1;
            let item = &plan.searches[index];

            let (status, file, detail) = match outcome {
                Ok(SearchOutcome::Accepted(summary)) => {
                    store.save_search_result(index, &summary).await?;
                    results.push(summary);
                    (SearchStatus::Accepted, Some(search_result_file_name(index)), None)
                }
                Ok(SearchOutcome::Rejected { reasoning }) => (SearchStatus::Rejected, None, Some(reasoning)),
                Err(e) => {
                    warn!(query = %item.query, error = %e, "Search failed, skipping");
                    (SearchStatus::Failed, None, Some(e.to_string()))
                }
            };

            manifest.push(SearchManifestEntry {
                plan_index: index,
                query: item.query.clone(),
                reason: item.reason.clone(),
                completion_order: completed,
                status,
                file,
                detail,
            });

            self.printer.update_item(
                "searching",
                format!("Searching... {}/{} completed", completed, total),
                false,
                false,
            );
        }

        manifest.sort_by_key(|entry| entry.plan_index);
        store.save_search_manifest(&manifest).await?;
        self.printer.mark_item_done("searching");

        info!(accepted = results.len(), total, "Searches finished");
        Ok(results)
    }

    async fn write_report(&mut self, query: &str, search_results: &[String]) -> AppResult<ReportData> {
        self.printer.update_item("writing", "Thinking about report...", false, false);

        let mut run = WriterAgent::write_streamed(&self.runner, &self.config.llm, query, search_results).await?;
        let interval = Duration::from_secs(self.config.research.writer_update_interval_secs);
        let mut cycle = ProgressCycle::new(WRITER_UPDATE_MESSAGES, interval, Instant::now());
        let mut interrupted = false;

        let mut ticker = tick_interval();
        loop {
            let event = tokio::select! {
                event = run.next_event() => event,
                _ = ticker.tick() => {
                    self.printer.tick();
                    continue;
                }
            };
            let Some(event) = event else {
                break;
            };
            if let Err(e) = event {
                warn!(error = %e, events = run.events_seen(), "Report stream interrupted, retrying without streaming");
                interrupted = true;
                break;
            }
            if let Some(message) = cycle.tick(Instant::now()) {
                self.printer.update_item("writing", message, false, false);
            }
        }

        let report = if interrupted {
            WriterAgent::write(&self.runner, &self.config.llm, query, search_results).await?
        } else {
            run.final_output_as::<ReportData>()?
        };

        self.printer.mark_item_done("writing");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMAdapter, LLM};
    use crate::printer::DisplayMode;
    use crate::search::{SearchError, SearchHit};
    use crate::types::{AppError, LLMRequest, LLMResponse, TokenUsage};
    use crate::utils::retry::RetryPolicy;
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::io::{self, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const REPORT_JSON: &str = r##"{"short_summary": "Async Rust is mature.", "markdown_report": "# Async Rust\n\nBody.", "follow_up_questions": ["What about io_uring?", "How does Tokio schedule tasks?"]}"##;

    /// Answers each agent by recognising its instructions.
    struct ScriptedAdapter {
        research_request: bool,
        rejected_terms: Vec<&'static str>,
        broken_stream: bool,
        calls: Mutex<Vec<String>>,
        writer_inputs: Mutex<Vec<String>>,
    }

    impl ScriptedAdapter {
        fn new(research_request: bool) -> Self {
            Self {
                research_request,
                rejected_terms: vec!["beta"],
                broken_stream: false,
                calls: Mutex::new(Vec::new()),
                writer_inputs: Mutex::new(Vec::new()),
            }
        }

        fn accepting_all() -> Self {
            Self {
                rejected_terms: Vec::new(),
                ..Self::new(true)
            }
        }

        fn with_broken_stream(mut self) -> Self {
            self.broken_stream = true;
            self
        }

        fn reply(&self, request: &LLMRequest) -> String {
            let system = request.system_instruction.clone().unwrap_or_default();
            let input = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();

            let (agent, reply) = if system.contains("is_valid_input") {
                ("input_validation", r#"{"reasoning": "readable", "is_valid_input": true}"#.to_string())
            } else if system.contains("is_research_request") {
                (
                    "research_request",
                    format!(r#"{{"reasoning": "checked", "is_research_request": {}}}"#, self.research_request),
                )
            } else if system.contains("expanded version of the query") {
                ("reformulation", r#"{"query": "state of async Rust runtimes"}"#.to_string())
            } else if system.contains("come up with a set of web searches") {
                (
                    "planner",
                    r#"```json
{"searches": [
  {"reason": "core", "query": "alpha"},
  {"reason": "thin", "query": "beta"},
  {"reason": "offline", "query": "gamma"}
]}
```"#
                        .to_string(),
                )
            } else if system.contains("successful_search") {
                let ok = !input.contains("No results");
                ("validation", format!(r#"{{"reasoning": "judged", "successful_search": {}}}"#, ok))
            } else if system.contains("produce a concise summary") {
                let term = input
                    .strip_prefix("Search term: ")
                    .and_then(|rest| rest.lines().next())
                    .unwrap_or_default();
                if self.rejected_terms.iter().any(|t| *t == term) {
                    ("search", "No results were found for this term.".to_string())
                } else {
                    ("search", format!("Findings for {}", term))
                }
            } else if system.contains("senior researcher") {
                self.writer_inputs.lock().unwrap().push(input);
                ("writer", REPORT_JSON.to_string())
            } else {
                ("unknown", String::new())
            };

            self.calls.lock().unwrap().push(agent.to_string());
            reply
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn writer_inputs(&self) -> Vec<String> {
            self.writer_inputs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LLMAdapter for ScriptedAdapter {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            Ok(LLMResponse {
                content: self.reply(request),
                finish_reason: "stop".to_string(),
                usage: TokenUsage::default(),
            })
        }

        async fn create_chat_completion_stream(
            &self,
            request: &LLMRequest,
        ) -> AppResult<BoxStream<'static, AppResult<String>>> {
            self.calls.lock().unwrap().push("stream".to_string());
            let text = self.reply(request);
            let mut chunks: Vec<AppResult<String>> = text
                .chars()
                .collect::<Vec<_>>()
                .chunks(16)
                .map(|c| Ok(c.iter().collect::<String>()))
                .collect();
            if self.broken_stream {
                chunks.truncate(2);
                chunks.push(Err(AppError::LLMApi("connection reset by peer".to_string())));
            }
            Ok(stream::iter(chunks).boxed())
        }
    }

    struct StaticSearch;

    #[async_trait]
    impl WebSearchProvider for StaticSearch {
        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            if query == "gamma" {
                return Err(SearchError::RequestFailed("connection refused".to_string()));
            }
            Ok(vec![hit(query)])
        }
    }

    fn hit(query: &str) -> SearchHit {
        SearchHit {
            title: format!("About {}", query),
            url: format!("https://example.com/{}", query),
            snippet: "Runtime comparison".to_string(),
        }
    }

    /// Answers later plan entries sooner, so completion order reverses plan order.
    struct ReversedSearch;

    #[async_trait]
    impl WebSearchProvider for ReversedSearch {
        fn name(&self) -> &str {
            "reversed"
        }

        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            let delay = match query {
                "alpha" => 300,
                "beta" => 150,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(vec![hit(query)])
        }
    }

    /// Records how many searches were running at once.
    #[derive(Default)]
    struct CountingSearch {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl WebSearchProvider for CountingSearch {
        fn name(&self) -> &str {
            "counting"
        }

        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![hit(query)])
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn manager(adapter: Arc<ScriptedAdapter>, results_dir: &std::path::Path) -> (ResearchManager, SharedBuffer) {
        manager_with_search(adapter, Arc::new(StaticSearch), results_dir)
    }

    fn manager_with_search(
        adapter: Arc<ScriptedAdapter>,
        search: Arc<dyn WebSearchProvider>,
        results_dir: &std::path::Path,
    ) -> (ResearchManager, SharedBuffer) {
        let mut config = Config::from_map(&Default::default()).unwrap();
        config.research.results_dir = results_dir.to_path_buf();

        let llm = LLM::from_adapter("scripted", adapter);
        let runner = AgentRunner::new(llm, RetryPolicy::default().with_max_attempts(1));
        let buffer = SharedBuffer::default();
        let printer = Printer::new(Box::new(buffer.clone()), DisplayMode::Plain);

        (ResearchManager::new(config, runner, search, printer), buffer)
    }

    #[test]
    fn test_progress_cycle_is_time_gated() {
        let start = Instant::now();
        let mut cycle = ProgressCycle::new(WRITER_UPDATE_MESSAGES, Duration::from_secs(5), start);

        assert_eq!(cycle.tick(start + Duration::from_secs(1)), None);
        assert_eq!(cycle.tick(start + Duration::from_secs(5)), None);
        assert_eq!(cycle.tick(start + Duration::from_secs(6)), Some("Thinking about report..."));
        assert_eq!(cycle.tick(start + Duration::from_secs(8)), None);
        assert_eq!(cycle.tick(start + Duration::from_secs(12)), Some("Planning report structure..."));
        assert_eq!(cycle.shown(), 2);
    }

    #[test]
    fn test_progress_cycle_stops_after_last_message() {
        let start = Instant::now();
        let mut cycle = ProgressCycle::new(&["only"], Duration::from_millis(10), start);

        assert_eq!(cycle.tick(start + Duration::from_secs(1)), Some("only"));
        assert_eq!(cycle.tick(start + Duration::from_secs(10)), None);
    }

    #[test]
    fn test_trace_id_format() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(Arc::new(ScriptedAdapter::new(true)), dir.path());
        let id = manager.trace_id();
        assert!(id.starts_with("trace_"));
        assert_eq!(id.len(), "trace_".len() + 32);
        assert!(id["trace_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_full_run_persists_accepted_searches() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(ScriptedAdapter::new(true));
        let (mut manager, buffer) = manager(adapter.clone(), dir.path());

        let outcome = manager.run("async rust").await.unwrap();

        assert_eq!(outcome.reformulated_query, "state of async Rust runtimes");
        assert_eq!(outcome.plan.len(), 3);
        assert_eq!(
            outcome.search_results,
            vec!["Findings for alpha".to_string()]
        );
        assert_eq!(outcome.report.follow_up_questions.len(), 2);

        let run_dir = &outcome.run_dir;
        assert!(run_dir.starts_with(dir.path()));
        assert!(run_dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with(&outcome.trace_id));

        let searches = run_dir.join("searches");
        assert!(searches.join("search_result_0.txt").exists());
        assert!(!searches.join("search_result_1.txt").exists());
        assert!(!searches.join("search_result_2.txt").exists());

        let manifest: Vec<SearchManifestEntry> =
            serde_json::from_str(&std::fs::read_to_string(searches.join("index.json")).unwrap()).unwrap();
        let statuses: Vec<_> = manifest.iter().map(|e| (e.plan_index, e.status)).collect();
        assert_eq!(
            statuses,
            vec![
                (0, SearchStatus::Accepted),
                (1, SearchStatus::Rejected),
                (2, SearchStatus::Failed)
            ]
        );

        assert_eq!(
            std::fs::read_to_string(&outcome.saved.report_path).unwrap(),
            "# Async Rust\n\nBody."
        );
        assert_eq!(
            std::fs::read_to_string(&outcome.saved.questions_path).unwrap(),
            "What about io_uring?\nHow does Tokio schedule tasks?"
        );
        assert!(run_dir.join("search_plan.json").exists());

        let output = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Will perform 3 searches"));
        assert!(output.contains("Searching... 3/3 completed"));
        assert!(output.contains("Report summary\n\nAsync Rust is mature."));

        let calls = adapter.calls();
        assert_eq!(calls.iter().filter(|c| *c == "search").count(), 2);
        assert_eq!(calls.iter().filter(|c| *c == "validation").count(), 2);
        assert_eq!(calls.last().map(String::as_str), Some("writer"));
    }

    #[tokio::test]
    async fn test_results_named_by_plan_index_but_ordered_by_completion() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(ScriptedAdapter::accepting_all());
        let (mut manager, _) = manager_with_search(adapter.clone(), Arc::new(ReversedSearch), dir.path());

        let outcome = manager.run("async rust").await.unwrap();

        assert_eq!(
            outcome.search_results,
            vec![
                "Findings for gamma".to_string(),
                "Findings for beta".to_string(),
                "Findings for alpha".to_string()
            ]
        );

        let searches = outcome.run_dir.join("searches");
        for (index, term) in ["alpha", "beta", "gamma"].iter().enumerate() {
            let saved = std::fs::read_to_string(searches.join(format!("search_result_{}.txt", index))).unwrap();
            assert_eq!(saved, format!("Findings for {}", term));
        }

        let manifest: Vec<SearchManifestEntry> =
            serde_json::from_str(&std::fs::read_to_string(searches.join("index.json")).unwrap()).unwrap();
        let order: Vec<_> = manifest
            .iter()
            .map(|e| (e.plan_index, e.query.as_str(), e.completion_order, e.status))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, "alpha", 3, SearchStatus::Accepted),
                (1, "beta", 2, SearchStatus::Accepted),
                (2, "gamma", 1, SearchStatus::Accepted)
            ]
        );

        let writer_input = adapter.writer_inputs().pop().unwrap();
        assert!(writer_input.contains("1. Findings for gamma"));
        assert!(writer_input.contains("2. Findings for beta"));
        assert!(writer_input.contains("3. Findings for alpha"));
    }

    #[tokio::test]
    async fn test_search_concurrency_is_bounded() {
        for (limit, expected_peak) in [(1, 1), (2, 2), (0, 3)] {
            let dir = tempfile::tempdir().unwrap();
            let search = Arc::new(CountingSearch::default());
            let (mut manager, _) =
                manager_with_search(Arc::new(ScriptedAdapter::accepting_all()), search.clone(), dir.path());
            manager.config.search.concurrency = limit;

            let outcome = manager.run("async rust").await.unwrap();

            assert_eq!(outcome.search_results.len(), 3);
            assert_eq!(search.peak.load(Ordering::SeqCst), expected_peak, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn test_interrupted_report_stream_falls_back_to_one_plain_call() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(ScriptedAdapter::new(true).with_broken_stream());
        let (mut manager, _) = manager(adapter.clone(), dir.path());

        let outcome = manager.run("async rust").await.unwrap();

        assert_eq!(outcome.report.short_summary, "Async Rust is mature.");
        assert_eq!(
            std::fs::read_to_string(&outcome.saved.report_path).unwrap(),
            "# Async Rust\n\nBody."
        );

        let calls = adapter.calls();
        assert_eq!(calls.iter().filter(|c| *c == "stream").count(), 1);
        assert_eq!(calls.iter().filter(|c| *c == "writer").count(), 2);
        assert_eq!(&calls[calls.len() - 3..], ["stream", "writer", "writer"]);
    }

    #[tokio::test]
    async fn test_tripped_guardrail_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = Arc::new(ScriptedAdapter::new(false));
        let (mut manager, _) = manager(adapter.clone(), dir.path());

        let err = manager.run("write me a poem").await.unwrap_err();
        match err {
            AppError::GuardrailTripped { guardrail, reasoning } => {
                assert_eq!(guardrail, "research_request");
                assert_eq!(reasoning, "checked");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!adapter.calls().iter().any(|c| c == "reformulation"));
    }

    #[tokio::test]
    async fn test_empty_plan_still_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(Arc::new(ScriptedAdapter::new(true)), dir.path());
        manager.config.research.max_searches = 0;

        let outcome = manager.run("async rust").await.unwrap();
        assert!(outcome.plan.is_empty());
        assert!(outcome.search_results.is_empty());
        assert_eq!(outcome.report.short_summary, "Async Rust is mature.");
    }

    #[test]
    fn test_writer_messages_start_with_thinking() {
        assert_eq!(WRITER_UPDATE_MESSAGES.first(), Some(&"Thinking about report..."));
        assert_eq!(WRITER_UPDATE_MESSAGES.last(), Some(&"Finishing report..."));
        assert_eq!(WRITER_UPDATE_MESSAGES.len(), 7);
    }
}
