use clap::Parser;
use deep_research::{
    agents::AgentRunner,
    config::Config,
    llm::{LLMProviderConfig, LLM},
    manager::ResearchManager,
    printer::Printer,
    search::build_provider,
    types::AppError,
    utils::{init_logger, RetryPolicy},
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Research a question on the web and write a report
#[derive(Parser, Debug)]
#[command(name = "deep-research", version)]
struct Cli {
    /// What to research; prompted for when omitted
    query: Vec<String>,

    /// Root directory for run results
    #[arg(long)]
    results_dir: Option<PathBuf>,

    /// LLM provider (openai, groq, openrouter, glm, glm-coding)
    #[arg(long)]
    provider: Option<String>,

    /// Model for every agent without a dedicated model
    #[arg(long)]
    model: Option<String>,

    /// Search backend (duckduckgo, duckduckgo-html, serpapi)
    #[arg(long)]
    search_provider: Option<String>,

    /// Maximum number of searches to run
    #[arg(long)]
    max_searches: Option<usize>,

    /// Skip the input guardrails
    #[arg(long)]
    no_guardrails: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(dir) = &self.results_dir {
            config.research.results_dir = dir.clone();
        }
        if let Some(provider) = &self.provider {
            config.llm.provider = provider.to_lowercase();
        }
        if let Some(model) = &self.model {
            // Planner and writer follow the default model unless set on their own.
            if config.llm.planner_model == config.llm.default_model {
                config.llm.planner_model = model.clone();
            }
            if config.llm.writer_model == config.llm.default_model {
                config.llm.writer_model = model.clone();
            }
            config.llm.default_model = model.clone();
        }
        if let Some(search_provider) = &self.search_provider {
            config.search.provider = search_provider.to_lowercase();
        }
        if let Some(max) = self.max_searches {
            config.research.max_searches = max;
        }
        if self.no_guardrails {
            config.research.guardrails_enabled = false;
        }
    }

    fn query(&self) -> Option<String> {
        let joined = self.query.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn prompt_for_query() -> anyhow::Result<String> {
    print!("Q: What would you like to research?\nA: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let query = line.trim().to_string();
    if query.is_empty() {
        anyhow::bail!("No research query given");
    }
    Ok(query)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    cli.apply_overrides(&mut config);

    // Dropping the guard flushes buffered log lines; keep it until exit.
    let _guard = init_logger(&config.logging.log_dir)?;
    info!(provider = %config.llm.provider, search = %config.search.provider, "Configuration loaded");

    let query = match cli.query() {
        Some(query) => query,
        None => prompt_for_query()?,
    };

    let llm = LLM::new(LLMProviderConfig::from_config(&config.llm)?)?;
    let runner = AgentRunner::new(llm, RetryPolicy::default().with_max_attempts(config.llm.max_retries));
    let search = build_provider(&config.search).map_err(AppError::from)?;

    let mut manager = ResearchManager::new(config, runner, search, Printer::stdout());
    let outcome = manager.run(&query).await?;

    println!("\nReport saved to: {}", outcome.saved.report_path.display());
    println!("Follow-up questions saved to: {}", outcome.saved.questions_path.display());

    println!("\n\n=====REPORT=====\n\n");
    println!("Report: {}", outcome.report.markdown_report);
    println!("\n\n=====FOLLOW UP QUESTIONS=====\n\n");
    println!("Follow up questions: {}", outcome.report.follow_up_questions.join("\n"));

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(AppError::GuardrailTripped { guardrail, reasoning }) = e.downcast_ref::<AppError>() {
                eprintln!("Request rejected by the {} guardrail: {}", guardrail, reasoning);
                return ExitCode::from(2);
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
