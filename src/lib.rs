// Deep Research - LLM-driven web research pipeline

pub mod agents;
pub mod config;
pub mod llm;
pub mod manager;
pub mod printer;
pub mod search;  // Web search backends (DuckDuckGo, DuckDuckGo HTML, SerpAPI)
pub mod storage; // Timestamped run directories
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use manager::{ResearchManager, ResearchOutcome};
// Note: import specific items from types instead of glob to avoid name conflicts
// with llm's re-exports, e.g. use deep_research::types::{AppError, AppResult};
