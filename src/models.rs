//! Core data models used throughout Planwise.
//!
//! These types represent the documents, chunks, analyses, and daily logs
//! that flow through the ingestion and planning pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declared kind of an uploaded file, derived from its filename suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Txt,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Txt => "txt",
        }
    }
}

/// An ingested document: raw identity plus its full extracted text.
///
/// Immutable once created, except for the derived chunk set.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub file_kind: String,
    pub file_size: i64,
    pub content: String,
    pub created_at: i64,
}

/// A chunk of a document's text, with its embedding once computed.
///
/// Chunk indices within a document are contiguous from 0. The embedding is
/// `None` until the provider has produced a vector for it.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: i64,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
}

/// The time-estimation record inside a [`ProjectAnalysis`].
///
/// All fields are free-form strings produced by the LLM ("120 hours
/// (including 1.5x buffer)"), not strictly numeric.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeEstimate {
    #[serde(default)]
    pub base_hours_required: Option<String>,
    #[serde(default)]
    pub total_hours_estimated: Option<String>,
    #[serde(default)]
    pub total_duration_weeks: Option<String>,
    #[serde(default)]
    pub total_duration_days: Option<String>,
    #[serde(default)]
    pub development_phase: Option<String>,
    #[serde(default)]
    pub testing_phase: Option<String>,
    #[serde(default)]
    pub deployment_phase: Option<String>,
    #[serde(default)]
    pub buffer_included: Option<String>,
}

/// Structured project analysis as returned by the LLM.
///
/// This is the exact response schema the analysis prompt demands; it doubles
/// as the deserialization target for the extracted JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub project_name: String,
    pub project_summary: String,
    pub scope_and_deliverables: String,
    #[serde(default)]
    pub time_estimation: TimeEstimate,
    #[serde(default)]
    pub developer_tasks: Vec<String>,
    #[serde(default)]
    pub technology_stack: Vec<String>,
    #[serde(default)]
    pub complexity_level: String,
}

/// A persisted project record: one analysis, one owner, one source document.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub document_id: String,
    pub analysis: ProjectAnalysis,
    pub created_at: i64,
}

/// Parameters for a project analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub project_name: Option<String>,
    pub daily_hours: i64,
    pub working_days_per_week: i64,
    pub technologies: Vec<String>,
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            project_name: None,
            daily_hours: 8,
            working_days_per_week: 5,
            technologies: Vec::new(),
        }
    }
}

/// A single task inside a daily log.
///
/// Identity for carryover and completion matching is the
/// `(task, estimated_hours)` pair; there is no stable per-task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task: String,
    pub estimated_hours: f64,
    #[serde(default)]
    pub task_done: bool,
}

impl Task {
    /// The identity pair used for carryover and completion matching.
    /// Hours are compared on their bit pattern so the pair is hashable.
    pub fn identity(&self) -> (&str, u64) {
        (self.task.as_str(), self.estimated_hours.to_bits())
    }
}

/// One day's plan for a project. Unique per (project, user, day_number).
#[derive(Debug, Clone)]
pub struct DailyLog {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub day_number: i64,
    pub target_date: NaiveDate,
    pub planned_hours: i64,
    pub tasks: Vec<Task>,
}

/// Completion counts returned by a completion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionSummary {
    pub completed: usize,
    pub remaining: usize,
    pub total: usize,
}

/// Technology breakdown by category, as returned by the tech-stack call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechCategories {
    #[serde(default)]
    pub frontend: Vec<String>,
    #[serde(default)]
    pub backend: Vec<String>,
    #[serde(default)]
    pub database: Vec<String>,
    #[serde(default)]
    pub cloud: Vec<String>,
    #[serde(default)]
    pub mobile: Vec<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub other: Vec<String>,
}

/// Result of the technology-stack extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechStackReport {
    #[serde(default)]
    pub detected_technologies: Vec<String>,
    #[serde(default)]
    pub recommended_technologies: Vec<String>,
    #[serde(default)]
    pub technology_categories: TechCategories,
}

/// Lightweight project listing row.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub id: String,
    pub project_name: String,
    pub project_summary: String,
    pub complexity_level: String,
    pub total_duration_weeks: Option<String>,
    pub created_at: i64,
}
