//! In-memory [`PlanStore`] implementation for tests.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Operations return immediately-ready futures.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{PlanError, PlanResult};
use crate::models::{Chunk, DailyLog, Document, Project, ProjectSummary};

use super::PlanStore;

/// In-memory store backing unit and integration tests.
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    chunks: RwLock<Vec<Chunk>>,
    projects: RwLock<HashMap<String, Project>>,
    // Keyed by (project_id, user_id, day_number).
    logs: RwLock<HashMap<(String, String, i64), DailyLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            chunks: RwLock::new(Vec::new()),
            projects: RwLock::new(HashMap::new()),
            logs: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn create_document(&self, doc: &Document) -> PlanResult<()> {
        let mut docs = self.docs.write().unwrap();
        docs.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn get_document(&self, user_id: &str, document_id: &str) -> PlanResult<Document> {
        let docs = self.docs.read().unwrap();
        docs.get(document_id)
            .filter(|d| d.user_id == user_id)
            .cloned()
            .ok_or_else(|| PlanError::DocumentNotFound(document_id.to_string()))
    }

    async fn replace_chunks(&self, document_id: &str, chunks: &[Chunk]) -> PlanResult<()> {
        let mut stored = self.chunks.write().unwrap();
        stored.retain(|c| c.document_id != document_id);
        stored.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn get_chunks(&self, document_id: &str) -> PlanResult<Vec<Chunk>> {
        let stored = self.chunks.read().unwrap();
        let mut result: Vec<Chunk> = stored
            .iter()
            .filter(|c| c.document_id == document_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.chunk_index);
        Ok(result)
    }

    async fn create_project(&self, project: &Project) -> PlanResult<()> {
        let mut projects = self.projects.write().unwrap();
        projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn get_project(&self, user_id: &str, project_id: &str) -> PlanResult<Project> {
        let projects = self.projects.read().unwrap();
        projects
            .get(project_id)
            .filter(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(|| PlanError::ProjectNotFound(project_id.to_string()))
    }

    async fn list_projects(&self, user_id: &str) -> PlanResult<Vec<ProjectSummary>> {
        let projects = self.projects.read().unwrap();
        let mut rows: Vec<ProjectSummary> = projects
            .values()
            .filter(|p| p.user_id == user_id)
            .map(|p| ProjectSummary {
                id: p.id.clone(),
                project_name: p.analysis.project_name.clone(),
                project_summary: p.analysis.project_summary.clone(),
                complexity_level: p.analysis.complexity_level.clone(),
                total_duration_weeks: p.analysis.time_estimation.total_duration_weeks.clone(),
                created_at: p.created_at,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn upsert_daily_log(&self, log: &DailyLog) -> PlanResult<()> {
        let key = (log.project_id.clone(), log.user_id.clone(), log.day_number);
        let mut logs = self.logs.write().unwrap();
        logs.insert(key, log.clone());
        Ok(())
    }

    async fn get_daily_log(
        &self,
        project_id: &str,
        user_id: &str,
        day_number: i64,
    ) -> PlanResult<Option<DailyLog>> {
        let logs = self.logs.read().unwrap();
        Ok(logs
            .get(&(project_id.to_string(), user_id.to_string(), day_number))
            .cloned())
    }
}
