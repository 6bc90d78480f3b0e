//! Storage abstraction for Planwise.
//!
//! The [`PlanStore`] trait defines all persistence operations needed by the
//! ingestion and planning pipeline, enabling pluggable backends (SQLite,
//! in-memory for tests).
//!
//! Every read is scoped by `user_id`: a caller can never see another
//! user's documents, projects, or daily logs.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::PlanResult;
use crate::models::{Chunk, DailyLog, Document, Project, ProjectSummary};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Abstract storage backend.
///
/// All operations are async (via `async-trait`). Writes that span multiple
/// rows (chunk batches, project creation) are atomic: either the whole
/// batch lands or nothing does.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Persist a new document record.
    async fn create_document(&self, doc: &Document) -> PlanResult<()>;

    /// Fetch a document owned by `user_id`.
    async fn get_document(&self, user_id: &str, document_id: &str) -> PlanResult<Document>;

    /// Atomically replace all chunks of a document with the given set.
    async fn replace_chunks(&self, document_id: &str, chunks: &[Chunk]) -> PlanResult<()>;

    /// Fetch a document's chunks ordered by `chunk_index`.
    async fn get_chunks(&self, document_id: &str) -> PlanResult<Vec<Chunk>>;

    /// Persist a new project with its analysis.
    async fn create_project(&self, project: &Project) -> PlanResult<()>;

    /// Fetch a project owned by `user_id`.
    async fn get_project(&self, user_id: &str, project_id: &str) -> PlanResult<Project>;

    /// List projects owned by `user_id`, most recent first.
    async fn list_projects(&self, user_id: &str) -> PlanResult<Vec<ProjectSummary>>;

    /// Insert or fully replace the daily log for the log's
    /// (project, user, day_number) key.
    async fn upsert_daily_log(&self, log: &DailyLog) -> PlanResult<()>;

    /// Fetch the daily log for a given project and day, if one exists.
    async fn get_daily_log(
        &self,
        project_id: &str,
        user_id: &str,
        day_number: i64,
    ) -> PlanResult<Option<DailyLog>>;
}
