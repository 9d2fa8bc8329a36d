//! Run Directory Storage
//!
//! Every research run writes its artifacts into a fresh directory named
//! `{YYYY-MM-DD-HH-MM-SS}_{trace_id}` under the results root:
//!
//! ```text
//! results/2025-01-31-14-05-09_trace_0af7.../
//! ├── search_plan.json
//! ├── final_report.md
//! ├── follow_up_questions.txt
//! └── searches/
//!     ├── index.json
//!     ├── search_result_0.txt
//!     └── search_result_3.txt
//! ```
//!
//! Search result files are named by the item's position in the plan, so a
//! file always maps back to the search that produced it regardless of the
//! order searches finished in.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::agents::{ReportData, WebSearchItem, WebSearchPlan};
use crate::types::AppResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Accepted,
    Rejected,
    Failed,
}

/// One line of `searches/index.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchManifestEntry {
    pub plan_index: usize,
    pub query: String,
    pub reason: String,
    /// 1-based position in which this search finished
    pub completion_order: usize,
    pub status: SearchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Validator reasoning or error message for skipped searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct PlanRecord<'a> {
    query: &'a str,
    reformulated_query: &'a str,
    searches: &'a [WebSearchItem],
}

/// Paths written by [`ResultsStore::save_final_report`]
#[derive(Debug, Clone, PartialEq)]
pub struct SavedReport {
    pub report_path: PathBuf,
    pub questions_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ResultsStore {
    run_dir: PathBuf,
    searches_dir: PathBuf,
}

impl ResultsStore {
    /// Create the run directory for `trace_id` under `root`, stamped with the current local time.
    pub async fn create(root: impl AsRef<Path>, trace_id: &str) -> AppResult<Self> {
        Self::create_at(root, trace_id, Local::now()).await
    }

    pub async fn create_at(root: impl AsRef<Path>, trace_id: &str, now: DateTime<Local>) -> AppResult<Self> {
        let run_dir = root.as_ref().join(run_dir_name(trace_id, now));
        let searches_dir = run_dir.join("searches");
        fs::create_dir_all(&searches_dir).await?;

        info!(path = %run_dir.display(), "Created results directory");
        Ok(Self { run_dir, searches_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn searches_dir(&self) -> &Path {
        &self.searches_dir
    }

    pub async fn save_search_result(&self, plan_index: usize, text: &str) -> AppResult<PathBuf> {
        let path = self.searches_dir.join(search_result_file_name(plan_index));
        fs::write(&path, text).await?;
        debug!(path = %path.display(), plan_index, "Saved search result");
        Ok(path)
    }

    pub async fn save_search_manifest(&self, entries: &[SearchManifestEntry]) -> AppResult<PathBuf> {
        let path = self.searches_dir.join("index.json");
        fs::write(&path, serde_json::to_string_pretty(entries)?).await?;
        Ok(path)
    }

    pub async fn save_plan(&self, query: &str, reformulated_query: &str, plan: &WebSearchPlan) -> AppResult<PathBuf> {
        let path = self.run_dir.join("search_plan.json");
        let record = PlanRecord {
            query,
            reformulated_query,
            searches: &plan.searches,
        };
        fs::write(&path, serde_json::to_string_pretty(&record)?).await?;
        Ok(path)
    }

    pub async fn save_final_report(&self, report: &ReportData) -> AppResult<SavedReport> {
        let report_path = self.run_dir.join("final_report.md");
        fs::write(&report_path, &report.markdown_report).await?;

        let questions_path = self.run_dir.join("follow_up_questions.txt");
        fs::write(&questions_path, report.follow_up_questions.join("\n")).await?;

        info!(report = %report_path.display(), "Saved final report");
        Ok(SavedReport {
            report_path,
            questions_path,
        })
    }
}

pub fn run_dir_name(trace_id: &str, now: DateTime<Local>) -> String {
    format!("{}_{}", now.format(TIMESTAMP_FORMAT), trace_id)
}

pub fn search_result_file_name(plan_index: usize) -> String {
    format!("search_result_{}.txt", plan_index)
}
