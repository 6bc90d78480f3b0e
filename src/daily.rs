//! Day-by-day task planning.
//!
//! Generates a concrete task list for one working day of a project,
//! carries unfinished tasks over from the previous day, and records
//! completion reports. Task identity for carryover and completion
//! matching is the `(task, estimated_hours)` pair.
//!
//! Writes to the same (project, day) are serialized through a keyed async
//! lock so concurrent plan/report calls cannot interleave their
//! read-modify-write cycles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::{PlanError, PlanResult};
use crate::jsonx;
use crate::llm::ChatModel;
use crate::models::{CompletionSummary, DailyLog, Project, Task};
use crate::store::PlanStore;

const DAILY_MAX_TOKENS: u32 = 1500;

const DAILY_SYSTEM_PROMPT: &str = "You are a software project planner. You break project \
work into concrete daily tasks with realistic hour estimates. Respond with a single JSON \
object and nothing else.";

const DAILY_USER_TEMPLATE: &str = r#"Plan day {day_number} of the project below. Produce tasks that together fill exactly {planned_hours} working hours.

Project: {project_name}
Summary: {project_summary}
Overall task list: {developer_tasks}
Technology stack: {technology_stack}
{carryover_context}

Respond with JSON exactly in this shape:
{
  "tasks": [
    {"task": "...", "estimated_hours": 2.5}
  ]
}"#;

#[derive(serde::Deserialize)]
struct GeneratedTasks {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// Serializes daily-log writes per (project, day).
pub struct DailyPlanner {
    locks: Mutex<HashMap<(String, i64), Arc<Mutex<()>>>>,
}

impl DailyPlanner {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, project_id: &str, day_number: i64) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // A uniquely-held Arc means no operation is using that entry;
        // drop it so the map tracks only in-flight (project, day) keys.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry((project_id.to_string(), day_number))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Generate (or regenerate) the task plan for one day of a project.
    ///
    /// Incomplete tasks from day `day_number - 1` are carried over and
    /// appended to the freshly generated list. The resulting log replaces
    /// any existing log for the same (project, user, day).
    ///
    /// Unlike analysis, an unparseable response here is a hard
    /// [`PlanError::ParseFailure`]: there is no useful fallback plan.
    pub async fn generate_daily_plan(
        &self,
        store: &dyn PlanStore,
        chat: &dyn ChatModel,
        user_id: &str,
        project_id: &str,
        day_number: i64,
        target_date: NaiveDate,
        planned_hours: i64,
    ) -> PlanResult<DailyLog> {
        let guard = self.lock_for(project_id, day_number).await;
        let _held = guard.lock().await;

        let project = store.get_project(user_id, project_id).await?;

        let carryover = if day_number > 1 {
            match store.get_daily_log(project_id, user_id, day_number - 1).await? {
                Some(previous) => previous
                    .tasks
                    .into_iter()
                    .filter(|t| !t.task_done)
                    .collect(),
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        let user_prompt = build_daily_prompt(&project, day_number, planned_hours, &carryover);
        let response = chat
            .complete(DAILY_SYSTEM_PROMPT, &user_prompt, DAILY_MAX_TOKENS)
            .await?;

        let generated: GeneratedTasks = jsonx::parse_lenient(&response)?;

        let mut tasks: Vec<Task> = generated
            .tasks
            .into_iter()
            .map(|t| Task {
                task_done: false,
                ..t
            })
            .collect();
        tasks.extend(carryover.into_iter().map(|t| Task {
            task_done: false,
            ..t
        }));

        let log = DailyLog {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
            day_number,
            target_date,
            planned_hours,
            tasks,
        };

        store.upsert_daily_log(&log).await?;
        info!(
            project_id,
            day_number,
            tasks = log.tasks.len(),
            "daily plan generated"
        );
        Ok(log)
    }

    /// Record which of a day's tasks are done.
    ///
    /// The completed set fully determines every task's done flag: a task
    /// whose `(task, estimated_hours)` identity is in the set is marked
    /// done, every other task is marked not done, regardless of previous
    /// state. Returns the updated log and the completion counts.
    pub async fn report_completion(
        &self,
        store: &dyn PlanStore,
        user_id: &str,
        project_id: &str,
        day_number: i64,
        completed: &[Task],
    ) -> PlanResult<(DailyLog, CompletionSummary)> {
        let guard = self.lock_for(project_id, day_number).await;
        let _held = guard.lock().await;

        let mut log = store
            .get_daily_log(project_id, user_id, day_number)
            .await?
            .ok_or_else(|| PlanError::LogNotFound {
                project_id: project_id.to_string(),
                day_number,
            })?;

        let done_set: HashSet<(String, u64)> = completed
            .iter()
            .map(|t| (t.task.clone(), t.estimated_hours.to_bits()))
            .collect();

        for task in &mut log.tasks {
            let (name, bits) = task.identity();
            task.task_done = done_set.contains(&(name.to_string(), bits));
        }

        store.upsert_daily_log(&log).await?;

        let total = log.tasks.len();
        let completed_count = log.tasks.iter().filter(|t| t.task_done).count();
        let summary = CompletionSummary {
            completed: completed_count,
            remaining: total - completed_count,
            total,
        };
        info!(project_id, day_number, completed = summary.completed, total, "completion recorded");
        Ok((log, summary))
    }
}

impl Default for DailyPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch a day's log, failing if none exists.
pub async fn get_daily_log(
    store: &dyn PlanStore,
    user_id: &str,
    project_id: &str,
    day_number: i64,
) -> PlanResult<DailyLog> {
    store
        .get_daily_log(project_id, user_id, day_number)
        .await?
        .ok_or_else(|| PlanError::LogNotFound {
            project_id: project_id.to_string(),
            day_number,
        })
}

fn build_daily_prompt(
    project: &Project,
    day_number: i64,
    planned_hours: i64,
    carryover: &[Task],
) -> String {
    let carryover_context = if carryover.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = carryover.iter().map(|t| t.task.as_str()).collect();
        format!(
            "Already carried over from the previous day (do not regenerate these): {}.",
            names.join("; ")
        )
    };

    DAILY_USER_TEMPLATE
        .replace("{day_number}", &day_number.to_string())
        .replace("{planned_hours}", &planned_hours.to_string())
        .replace("{project_name}", &project.analysis.project_name)
        .replace("{project_summary}", &project.analysis.project_summary)
        .replace(
            "{developer_tasks}",
            &project.analysis.developer_tasks.join("; "),
        )
        .replace(
            "{technology_stack}",
            &project.analysis.technology_stack.join(", "),
        )
        .replace("{carryover_context}", &carryover_context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProjectAnalysis, TimeEstimate};
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct ScriptedChat {
        response: String,
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(&self, _: &str, _: &str, _: u32) -> PlanResult<String> {
            Ok(self.response.clone())
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, day).unwrap()
    }

    fn task(name: &str, hours: f64, done: bool) -> Task {
        Task {
            task: name.to_string(),
            estimated_hours: hours,
            task_done: done,
        }
    }

    async fn seed_project(store: &MemoryStore) -> String {
        let project = Project {
            id: "p1".to_string(),
            user_id: "alice".to_string(),
            document_id: "d1".to_string(),
            analysis: ProjectAnalysis {
                project_name: "Bookings".to_string(),
                project_summary: "A booking platform.".to_string(),
                scope_and_deliverables: "Bookings and payments.".to_string(),
                time_estimation: TimeEstimate::default(),
                developer_tasks: vec!["Build booking API".to_string()],
                technology_stack: vec!["Rust".to_string()],
                complexity_level: "Medium".to_string(),
            },
            created_at: 0,
        };
        store.create_project(&project).await.unwrap();
        project.id
    }

    fn tasks_json(tasks: &[(&str, f64)]) -> String {
        let items: Vec<serde_json::Value> = tasks
            .iter()
            .map(|(name, hours)| serde_json::json!({"task": name, "estimated_hours": hours}))
            .collect();
        serde_json::json!({"tasks": items}).to_string()
    }

    #[tokio::test]
    async fn generates_and_persists_day_one() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();
        let chat = ScriptedChat {
            response: tasks_json(&[("Scaffold the service", 3.0), ("Write booking model", 5.0)]),
        };

        let log = planner
            .generate_daily_plan(&store, &chat, "alice", &project_id, 1, date(1), 8)
            .await
            .unwrap();
        assert_eq!(log.tasks.len(), 2);
        assert!(log.tasks.iter().all(|t| !t.task_done));

        let fetched = get_daily_log(&store, "alice", &project_id, 1).await.unwrap();
        assert_eq!(fetched.planned_hours, 8);
    }

    #[tokio::test]
    async fn carries_over_incomplete_tasks() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();

        let day1 = DailyLog {
            id: "l1".to_string(),
            project_id: project_id.clone(),
            user_id: "alice".to_string(),
            day_number: 1,
            target_date: date(1),
            planned_hours: 8,
            tasks: vec![
                task("Scaffold the service", 3.0, true),
                task("Write booking model", 5.0, false),
            ],
        };
        store.upsert_daily_log(&day1).await.unwrap();

        let chat = ScriptedChat {
            response: tasks_json(&[("Add payment flow", 4.0)]),
        };
        let log = planner
            .generate_daily_plan(&store, &chat, "alice", &project_id, 2, date(2), 8)
            .await
            .unwrap();

        let names: Vec<&str> = log.tasks.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(names, vec!["Add payment flow", "Write booking model"]);
        assert!(log.tasks.iter().all(|t| !t.task_done));
    }

    #[tokio::test]
    async fn day_one_has_no_carryover() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();
        let chat = ScriptedChat {
            response: tasks_json(&[("First task", 8.0)]),
        };

        let log = planner
            .generate_daily_plan(&store, &chat, "alice", &project_id, 1, date(1), 8)
            .await
            .unwrap();
        assert_eq!(log.tasks.len(), 1);
    }

    #[tokio::test]
    async fn regenerating_replaces_previous_plan() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();

        let first = ScriptedChat {
            response: tasks_json(&[("Old task", 8.0)]),
        };
        planner
            .generate_daily_plan(&store, &first, "alice", &project_id, 1, date(1), 8)
            .await
            .unwrap();

        let second = ScriptedChat {
            response: tasks_json(&[("New task", 8.0)]),
        };
        let log = planner
            .generate_daily_plan(&store, &second, "alice", &project_id, 1, date(1), 8)
            .await
            .unwrap();
        assert_eq!(log.tasks.len(), 1);
        assert_eq!(log.tasks[0].task, "New task");
    }

    #[tokio::test]
    async fn unparseable_plan_is_a_hard_error() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();
        let chat = ScriptedChat {
            response: "no json".to_string(),
        };

        let err = planner
            .generate_daily_plan(&store, &chat, "alice", &project_id, 1, date(1), 8)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::ParseFailure(_)));
        assert!(store.get_daily_log(&project_id, "alice", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn completion_is_a_full_overwrite() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();

        let day1 = DailyLog {
            id: "l1".to_string(),
            project_id: project_id.clone(),
            user_id: "alice".to_string(),
            day_number: 1,
            target_date: date(1),
            planned_hours: 8,
            tasks: vec![
                task("A", 2.0, true),
                task("B", 3.0, false),
                task("C", 3.0, false),
            ],
        };
        store.upsert_daily_log(&day1).await.unwrap();

        // Only B reported done: A loses its flag, B gains one.
        let (log, summary) = planner
            .report_completion(&store, "alice", &project_id, 1, &[task("B", 3.0, true)])
            .await
            .unwrap();

        assert!(!log.tasks[0].task_done);
        assert!(log.tasks[1].task_done);
        assert!(!log.tasks[2].task_done);
        assert_eq!(
            summary,
            CompletionSummary {
                completed: 1,
                remaining: 2,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn completion_matches_on_hours_too() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();

        let day1 = DailyLog {
            id: "l1".to_string(),
            project_id: project_id.clone(),
            user_id: "alice".to_string(),
            day_number: 1,
            target_date: date(1),
            planned_hours: 8,
            tasks: vec![task("A", 2.0, false)],
        };
        store.upsert_daily_log(&day1).await.unwrap();

        // Same name, different hours: not the same task.
        let (log, summary) = planner
            .report_completion(&store, "alice", &project_id, 1, &[task("A", 4.0, true)])
            .await
            .unwrap();
        assert!(!log.tasks[0].task_done);
        assert_eq!(summary.completed, 0);
    }

    #[tokio::test]
    async fn lock_map_does_not_accumulate_idle_entries() {
        let planner = DailyPlanner::new();
        for day in 1..=50 {
            let guard = planner.lock_for("p1", day).await;
            drop(guard);
        }
        let locks = planner.locks.lock().await;
        assert!(locks.len() <= 1, "idle lock entries retained: {}", locks.len());
    }

    #[tokio::test]
    async fn reporting_without_a_log_fails() {
        let store = MemoryStore::new();
        let project_id = seed_project(&store).await;
        let planner = DailyPlanner::new();

        let err = planner
            .report_completion(&store, "alice", &project_id, 3, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::LogNotFound { day_number: 3, .. }));
    }
}
