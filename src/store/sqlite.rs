//! SQLite [`PlanStore`] implementation.
//!
//! Chunk embeddings are stored as little-endian f32 BLOBs. Task lists and
//! the structured parts of an analysis are stored as JSON text columns;
//! scalar analysis fields get their own columns so project listings never
//! deserialize full analyses.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::config::DbConfig;
use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::error::{PlanError, PlanResult};
use crate::models::{
    Chunk, DailyLog, Document, Project, ProjectAnalysis, ProjectSummary, Task, TimeEstimate,
};

use super::PlanStore;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at the configured path, creating the file and its
    /// parent directory if needed. WAL journal, single connection — the CLI
    /// issues one operation at a time.
    pub async fn connect(config: &DbConfig) -> PlanResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlanError::PersistenceFailure(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PlanResult<String> {
    serde_json::to_string(value).map_err(|e| PlanError::PersistenceFailure(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> PlanResult<T> {
    serde_json::from_str(text).map_err(|e| PlanError::PersistenceFailure(e.to_string()))
}

fn parse_date(text: &str) -> PlanResult<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| PlanError::PersistenceFailure(format!("bad target_date '{}': {}", text, e)))
}

fn row_to_project(row: &sqlx::sqlite::SqliteRow) -> PlanResult<Project> {
    let time_estimation: TimeEstimate = from_json(&row.get::<String, _>("time_estimation_json"))?;
    let developer_tasks: Vec<String> = from_json(&row.get::<String, _>("developer_tasks_json"))?;
    let technology_stack: Vec<String> =
        from_json(&row.get::<String, _>("technology_stack_json"))?;

    Ok(Project {
        id: row.get("id"),
        user_id: row.get("user_id"),
        document_id: row.get("document_id"),
        analysis: ProjectAnalysis {
            project_name: row.get("project_name"),
            project_summary: row.get("project_summary"),
            scope_and_deliverables: row.get("scope_and_deliverables"),
            time_estimation,
            developer_tasks,
            technology_stack,
            complexity_level: row.get("complexity_level"),
        },
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl PlanStore for SqliteStore {
    async fn create_document(&self, doc: &Document) -> PlanResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, user_id, filename, file_kind, file_size, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.user_id)
        .bind(&doc.filename)
        .bind(&doc.file_kind)
        .bind(doc.file_size)
        .bind(&doc.content)
        .bind(doc.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_document(&self, user_id: &str, document_id: &str) -> PlanResult<Document> {
        let row = sqlx::query(
            "SELECT id, user_id, filename, file_kind, file_size, content, created_at
             FROM documents WHERE id = ? AND user_id = ?",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PlanError::DocumentNotFound(document_id.to_string()))?;

        Ok(Document {
            id: row.get("id"),
            user_id: row.get("user_id"),
            filename: row.get("filename"),
            file_kind: row.get("file_kind"),
            file_size: row.get("file_size"),
            content: row.get("content"),
            created_at: row.get("created_at"),
        })
    }

    async fn replace_chunks(&self, document_id: &str, chunks: &[Chunk]) -> PlanResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            let blob = chunk.embedding.as_ref().map(|v| vec_to_blob(v));
            sqlx::query(
                "INSERT INTO chunks (id, document_id, chunk_index, text, embedding)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_chunks(&self, document_id: &str) -> PlanResult<Vec<Chunk>> {
        let rows = sqlx::query(
            "SELECT id, document_id, chunk_index, text, embedding
             FROM chunks WHERE document_id = ? ORDER BY chunk_index",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Chunk {
                id: row.get("id"),
                document_id: row.get("document_id"),
                chunk_index: row.get("chunk_index"),
                text: row.get("text"),
                embedding: row
                    .get::<Option<Vec<u8>>, _>("embedding")
                    .map(|blob| blob_to_vec(&blob)),
            })
            .collect())
    }

    async fn create_project(&self, project: &Project) -> PlanResult<()> {
        let a = &project.analysis;
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, user_id, document_id,
                project_name, project_summary, scope_and_deliverables,
                time_estimation_json, developer_tasks_json, technology_stack_json,
                complexity_level, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.user_id)
        .bind(&project.document_id)
        .bind(&a.project_name)
        .bind(&a.project_summary)
        .bind(&a.scope_and_deliverables)
        .bind(to_json(&a.time_estimation)?)
        .bind(to_json(&a.developer_tasks)?)
        .bind(to_json(&a.technology_stack)?)
        .bind(&a.complexity_level)
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_project(&self, user_id: &str, project_id: &str) -> PlanResult<Project> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PlanError::ProjectNotFound(project_id.to_string()))?;

        row_to_project(&row)
    }

    async fn list_projects(&self, user_id: &str) -> PlanResult<Vec<ProjectSummary>> {
        let rows = sqlx::query(
            "SELECT id, project_name, project_summary, complexity_level,
                    time_estimation_json, created_at
             FROM projects WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let estimate: TimeEstimate = from_json(&row.get::<String, _>("time_estimation_json"))?;
            result.push(ProjectSummary {
                id: row.get("id"),
                project_name: row.get("project_name"),
                project_summary: row.get("project_summary"),
                complexity_level: row.get("complexity_level"),
                total_duration_weeks: estimate.total_duration_weeks,
                created_at: row.get("created_at"),
            });
        }
        Ok(result)
    }

    async fn upsert_daily_log(&self, log: &DailyLog) -> PlanResult<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_logs (id, project_id, user_id, day_number, target_date, planned_hours, tasks_json)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(project_id, user_id, day_number) DO UPDATE SET
                target_date = excluded.target_date,
                planned_hours = excluded.planned_hours,
                tasks_json = excluded.tasks_json
            "#,
        )
        .bind(&log.id)
        .bind(&log.project_id)
        .bind(&log.user_id)
        .bind(log.day_number)
        .bind(log.target_date.format("%Y-%m-%d").to_string())
        .bind(log.planned_hours)
        .bind(to_json(&log.tasks)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_daily_log(
        &self,
        project_id: &str,
        user_id: &str,
        day_number: i64,
    ) -> PlanResult<Option<DailyLog>> {
        let row = sqlx::query(
            "SELECT id, project_id, user_id, day_number, target_date, planned_hours, tasks_json
             FROM daily_logs WHERE project_id = ? AND user_id = ? AND day_number = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(day_number)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tasks: Vec<Task> = from_json(&row.get::<String, _>("tasks_json"))?;
        Ok(Some(DailyLog {
            id: row.get("id"),
            project_id: row.get("project_id"),
            user_id: row.get("user_id"),
            day_number: row.get("day_number"),
            target_date: parse_date(&row.get::<String, _>("target_date"))?,
            planned_hours: row.get("planned_hours"),
            tasks,
        }))
    }
}
