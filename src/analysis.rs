//! LLM-driven project analysis and technology stack extraction.
//!
//! Builds prompts from document text, parses the structured responses, and
//! persists the resulting project. Parse failures never surface to the
//! caller here: a response that cannot be read as JSON degrades to a
//! documented fallback value, so the caller always gets an analysis.
//! Transport and API failures do propagate.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{PlanError, PlanResult};
use crate::jsonx;
use crate::llm::ChatModel;
use crate::models::{
    AnalysisRequest, Project, ProjectAnalysis, TechCategories, TechStackReport, TimeEstimate,
};
use crate::store::PlanStore;

/// Document text beyond this many characters is truncated before prompting.
const MAX_CONTENT_CHARS: usize = 8000;

const ANALYSIS_MAX_TOKENS: u32 = 2000;
const TECH_STACK_MAX_TOKENS: u32 = 1000;

const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert project analyst and software \
estimation specialist. You read project documents and produce structured, realistic \
analyses. Respond with a single JSON object and nothing else.";

const ANALYSIS_USER_TEMPLATE: &str = r#"Analyze the following project document and produce a complete project analysis.

Project name: {project_name}
Working schedule: {daily_hours} hours per day, {working_days} days per week.
{technology_context}

Estimation methodology: first estimate the base hours required for the work
described, then multiply by 1.5 to include a buffer for integration, rework,
and the unexpected. Derive durations from the buffered total and the working
schedule above. State in the estimate that the 1.5x buffer is included.

Respond with JSON exactly in this shape:
{
  "project_name": "...",
  "project_summary": "...",
  "scope_and_deliverables": "...",
  "time_estimation": {
    "base_hours_required": "...",
    "total_hours_estimated": "...",
    "total_duration_weeks": "...",
    "total_duration_days": "...",
    "development_phase": "...",
    "testing_phase": "...",
    "deployment_phase": "...",
    "buffer_included": "Yes - 1.5x buffer applied"
  },
  "developer_tasks": ["...", "..."],
  "technology_stack": ["...", "..."],
  "complexity_level": "Low | Medium | High"
}

Project document:
{content}"#;

const TECH_STACK_SYSTEM_PROMPT: &str = "You are a technology stack analyst. You identify \
technologies mentioned in project documents and recommend suitable additions. Respond \
with a single JSON object and nothing else.";

const TECH_STACK_USER_TEMPLATE: &str = r#"Read the project document below. List the technologies it explicitly mentions, then recommend technologies that would suit the project.

Respond with JSON exactly in this shape:
{
  "detected_technologies": ["...", "..."],
  "recommended_technologies": ["...", "..."],
  "technology_categories": {
    "frontend": [], "backend": [], "database": [],
    "cloud": [], "mobile": [], "tools": [], "other": []
  }
}

Project document:
{content}"#;

/// Truncate document content to [`MAX_CONTENT_CHARS`] characters for
/// prompting, marking the cut with "...".
fn truncate_content(content: &str) -> String {
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        None => content.to_string(),
        Some((cut, _)) => format!("{}...", &content[..cut]),
    }
}

fn technology_context(technologies: &[String]) -> String {
    if technologies.is_empty() {
        "No technology preferences were given; recommend a suitable stack freely.".to_string()
    } else {
        format!(
            "The client requires these technologies; use them verbatim in the technology_stack \
             and plan all tasks around them: {}.",
            technologies.join(", ")
        )
    }
}

fn build_analysis_prompt(content: &str, request: &AnalysisRequest) -> String {
    let project_name = request
        .project_name
        .clone()
        .unwrap_or_else(|| "(infer from the document)".to_string());

    ANALYSIS_USER_TEMPLATE
        .replace("{project_name}", &project_name)
        .replace("{daily_hours}", &request.daily_hours.to_string())
        .replace("{working_days}", &request.working_days_per_week.to_string())
        .replace("{technology_context}", &technology_context(&request.technologies))
        .replace("{content}", &truncate_content(content))
}

/// The analysis returned when the model's response cannot be parsed.
///
/// Sentinel values make the failure visible to the user while keeping the
/// record usable for later planning.
fn fallback_analysis(project_name: Option<&str>) -> ProjectAnalysis {
    ProjectAnalysis {
        project_name: project_name.unwrap_or("Project Analysis Failed").to_string(),
        project_summary: "The analysis response could not be parsed. Please retry the analysis."
            .to_string(),
        scope_and_deliverables: "Unavailable".to_string(),
        time_estimation: TimeEstimate::default(),
        developer_tasks: vec!["Review the document and re-run the analysis".to_string()],
        technology_stack: Vec::new(),
        complexity_level: "Unknown".to_string(),
    }
}

/// The tech stack returned when the model's response cannot be parsed.
fn fallback_tech_stack() -> TechStackReport {
    let recommended = vec![
        "React".to_string(),
        "Node.js".to_string(),
        "MongoDB".to_string(),
        "Express.js".to_string(),
    ];
    TechStackReport {
        detected_technologies: Vec::new(),
        recommended_technologies: recommended.clone(),
        technology_categories: TechCategories {
            frontend: vec!["React".to_string()],
            backend: vec!["Node.js".to_string(), "Express.js".to_string()],
            database: vec!["MongoDB".to_string()],
            cloud: Vec::new(),
            mobile: Vec::new(),
            tools: vec!["Git".to_string(), "Docker".to_string()],
            other: Vec::new(),
        },
    }
}

/// Analyze a document and persist the resulting project.
///
/// The LLM response is parsed leniently; an unparseable response produces
/// the fallback analysis rather than an error. When the request names the
/// project, that name wins over whatever the model chose.
pub async fn analyze_project(
    store: &dyn PlanStore,
    chat: &dyn ChatModel,
    user_id: &str,
    document_id: &str,
    request: &AnalysisRequest,
) -> PlanResult<Project> {
    let document = store.get_document(user_id, document_id).await?;
    let user_prompt = build_analysis_prompt(&document.content, request);

    let response = chat
        .complete(ANALYSIS_SYSTEM_PROMPT, &user_prompt, ANALYSIS_MAX_TOKENS)
        .await?;

    let mut analysis = match jsonx::parse_lenient::<ProjectAnalysis>(&response) {
        Ok(analysis) => analysis,
        Err(PlanError::ParseFailure(reason)) => {
            warn!(%reason, "analysis response unparseable, using fallback");
            fallback_analysis(request.project_name.as_deref())
        }
        Err(e) => return Err(e),
    };

    if let Some(name) = &request.project_name {
        analysis.project_name = name.clone();
    }

    let project = Project {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        document_id: document_id.to_string(),
        analysis,
        created_at: chrono::Utc::now().timestamp(),
    };

    store.create_project(&project).await?;
    info!(project_id = %project.id, name = %project.analysis.project_name, "project analyzed");
    Ok(project)
}

/// Extract detected and recommended technologies for a document.
///
/// Not persisted; the report goes straight back to the caller. An
/// unparseable response degrades to a generic web-stack recommendation.
pub async fn extract_technology_stack(
    store: &dyn PlanStore,
    chat: &dyn ChatModel,
    user_id: &str,
    document_id: &str,
) -> PlanResult<TechStackReport> {
    let document = store.get_document(user_id, document_id).await?;
    let user_prompt =
        TECH_STACK_USER_TEMPLATE.replace("{content}", &truncate_content(&document.content));

    let response = chat
        .complete(TECH_STACK_SYSTEM_PROMPT, &user_prompt, TECH_STACK_MAX_TOKENS)
        .await?;

    match jsonx::parse_lenient::<TechStackReport>(&response) {
        Ok(report) => Ok(report),
        Err(PlanError::ParseFailure(reason)) => {
            warn!(%reason, "tech stack response unparseable, using fallback");
            Ok(fallback_tech_stack())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;
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

    struct FailingChat;

    #[async_trait]
    impl ChatModel for FailingChat {
        async fn complete(&self, _: &str, _: &str, _: u32) -> PlanResult<String> {
            Err(PlanError::ExternalServiceFailure("timeout".to_string()))
        }
    }

    async fn seed_document(store: &MemoryStore) -> String {
        let doc = Document {
            id: "d1".to_string(),
            user_id: "alice".to_string(),
            filename: "plan.txt".to_string(),
            file_kind: "txt".to_string(),
            file_size: 100,
            content: "Build a booking platform with payments and an admin portal.".to_string(),
            created_at: 0,
        };
        store.create_document(&doc).await.unwrap();
        doc.id
    }

    fn analysis_json(name: &str) -> String {
        serde_json::json!({
            "project_name": name,
            "project_summary": "A booking platform.",
            "scope_and_deliverables": "Bookings, payments, admin portal.",
            "time_estimation": {
                "base_hours_required": "80 hours",
                "total_hours_estimated": "120 hours",
                "total_duration_weeks": "3 weeks",
                "total_duration_days": "15 days",
                "buffer_included": "Yes - 1.5x buffer applied"
            },
            "developer_tasks": ["Set up repo", "Build booking API"],
            "technology_stack": ["Rust", "SQLite"],
            "complexity_level": "Medium"
        })
        .to_string()
    }

    #[tokio::test]
    async fn analyze_persists_project() {
        let store = MemoryStore::new();
        let doc_id = seed_document(&store).await;
        let chat = ScriptedChat {
            response: format!("Sure! Here it is:\n{}", analysis_json("Bookings")),
        };

        let project = analyze_project(&store, &chat, "alice", &doc_id, &AnalysisRequest::default())
            .await
            .unwrap();
        assert_eq!(project.analysis.project_name, "Bookings");
        assert_eq!(project.analysis.developer_tasks.len(), 2);

        let fetched = store.get_project("alice", &project.id).await.unwrap();
        assert_eq!(fetched.analysis.complexity_level, "Medium");
    }

    #[tokio::test]
    async fn requested_name_overrides_model_name() {
        let store = MemoryStore::new();
        let doc_id = seed_document(&store).await;
        let chat = ScriptedChat {
            response: analysis_json("Model Picked This"),
        };
        let request = AnalysisRequest {
            project_name: Some("Client Portal".to_string()),
            ..Default::default()
        };

        let project = analyze_project(&store, &chat, "alice", &doc_id, &request)
            .await
            .unwrap();
        assert_eq!(project.analysis.project_name, "Client Portal");
    }

    #[tokio::test]
    async fn unparseable_response_falls_back() {
        let store = MemoryStore::new();
        let doc_id = seed_document(&store).await;
        let chat = ScriptedChat {
            response: "I'm sorry, I can't produce JSON today.".to_string(),
        };

        let project = analyze_project(&store, &chat, "alice", &doc_id, &AnalysisRequest::default())
            .await
            .unwrap();
        assert_eq!(project.analysis.project_name, "Project Analysis Failed");
        assert_eq!(project.analysis.complexity_level, "Unknown");
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let store = MemoryStore::new();
        let doc_id = seed_document(&store).await;

        let err = analyze_project(
            &store,
            &FailingChat,
            "alice",
            &doc_id,
            &AnalysisRequest::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PlanError::ExternalServiceFailure(_)));
    }

    #[tokio::test]
    async fn tech_stack_parses_fenced_response() {
        let store = MemoryStore::new();
        let doc_id = seed_document(&store).await;
        let chat = ScriptedChat {
            response: "```json\n{\"detected_technologies\": [\"Stripe\"], \
                       \"recommended_technologies\": [\"Rust\"], \
                       \"technology_categories\": {\"backend\": [\"Rust\"]}}\n```"
                .to_string(),
        };

        let report = extract_technology_stack(&store, &chat, "alice", &doc_id)
            .await
            .unwrap();
        assert_eq!(report.detected_technologies, vec!["Stripe"]);
        assert_eq!(report.technology_categories.backend, vec!["Rust"]);
    }

    #[tokio::test]
    async fn tech_stack_falls_back_on_garbage() {
        let store = MemoryStore::new();
        let doc_id = seed_document(&store).await;
        let chat = ScriptedChat {
            response: "no json here".to_string(),
        };

        let report = extract_technology_stack(&store, &chat, "alice", &doc_id)
            .await
            .unwrap();
        assert!(report.recommended_technologies.contains(&"React".to_string()));
    }

    #[test]
    fn truncation_marks_the_cut() {
        let content = "a".repeat(MAX_CONTENT_CHARS + 500);
        let truncated = truncate_content(&content);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), MAX_CONTENT_CHARS + 3);

        let exact = "b".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_content(&exact), exact);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let content = "é".repeat(MAX_CONTENT_CHARS + 500);
        let truncated = truncate_content(&content);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS + 3);
    }

    #[test]
    fn technology_context_honors_client_list() {
        let ctx = technology_context(&["Vue".to_string(), "Postgres".to_string()]);
        assert!(ctx.contains("Vue, Postgres"));
        assert!(ctx.contains("verbatim"));
    }
}
