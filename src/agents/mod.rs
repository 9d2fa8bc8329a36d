//! Agent System
//!
//! Each research step is a small agent: instructions, a model and, for
//! structured steps, a JSON output contract. All agents share one
//! [`AgentRunner`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! User Query
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Guardrails  │  → Reject nonsense and non-research input
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │ Reformulation│  → Expanded query
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │   Planner    │  → Web searches with reasons
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │ Search +     │  → Summaries (in parallel, validated)
//! │ Validation   │
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │   Writer     │  → Report, summary, follow-up questions (streamed)
//! └──────────────┘
//! ```

pub mod guardrails;
pub mod planner;
pub mod reformulation;
pub mod runner;
pub mod search;
pub mod writer;

pub use guardrails::{GuardrailAgent, GuardrailVerdict};
pub use planner::{PlannerAgent, WebSearchItem, WebSearchPlan};
pub use reformulation::QueryReformulationAgent;
pub use runner::{Agent, AgentRunner, RunStream, StreamEvent};
pub use search::{search_and_validate, SearchAgent, SearchOutcome, SearchValidationAgent};
pub use writer::{ReportData, WriterAgent};
