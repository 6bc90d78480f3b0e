//! # Planwise CLI (`pw`)
//!
//! The `pw` binary is the interface to Planwise. It provides commands for
//! database initialization, document ingestion, LLM project analysis, and
//! day-by-day task planning.
//!
//! ## Usage
//!
//! ```bash
//! pw --config ./config/pw.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pw init` | Create the SQLite database and run schema migrations |
//! | `pw ingest <file>` | Upload a PDF or TXT project document |
//! | `pw analyze <document-id>` | Run the LLM project analysis |
//! | `pw tech-stack <document-id>` | Detect and recommend technologies |
//! | `pw projects` | List analyzed projects |
//! | `pw show <project-id>` | Print a project's full analysis |
//! | `pw plan <project-id>` | Generate a day's task plan |
//! | `pw report <project-id>` | Record which tasks are done |
//! | `pw log <project-id>` | Print a day's task plan |
//! | `pw search <document-id> "<query>"` | Rank document chunks by similarity |

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use planwise::analysis;
use planwise::config;
use planwise::daily::{self, DailyPlanner};
use planwise::embedding;
use planwise::ingest;
use planwise::llm::MistralChat;
use planwise::migrate;
use planwise::models::{AnalysisRequest, DailyLog, Task};
use planwise::search;
use planwise::store::{PlanStore, SqliteStore};

/// Planwise CLI — a local-first project planning assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pw.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pw",
    about = "Planwise — turn project documents into estimates and daily task plans",
    version,
    long_about = "Planwise ingests project documents (PDF or plain text), analyzes them with \
    an LLM into a structured estimate and task breakdown, and generates day-by-day task plans \
    with carryover and completion tracking."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pw.toml")]
    config: PathBuf,

    /// User whose documents and projects to operate on.
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (documents, chunks, projects, daily_logs). Idempotent.
    Init,

    /// Ingest a project document.
    ///
    /// Extracts text from a PDF or TXT file, chunks it on paragraph
    /// boundaries, embeds the chunks when an embedding provider is
    /// configured, and stores everything in SQLite. Documents with fewer
    /// than 100 non-whitespace characters are rejected.
    Ingest {
        /// Path to a `.pdf` or `.txt` file.
        file: PathBuf,
    },

    /// Analyze an ingested document into a project.
    ///
    /// Sends the document text to the configured LLM and stores the
    /// resulting summary, time estimate (1.5x buffered), task breakdown,
    /// and technology stack as a new project.
    Analyze {
        /// Document UUID (printed by `pw ingest`).
        document_id: String,

        /// Project name. Overrides whatever the model infers.
        #[arg(long)]
        name: Option<String>,

        /// Working hours per day used for duration estimates.
        #[arg(long, default_value_t = 8)]
        daily_hours: i64,

        /// Working days per week used for duration estimates.
        #[arg(long, default_value_t = 5)]
        days_per_week: i64,

        /// Required technology (repeatable). When given, the analysis
        /// uses these verbatim instead of recommending its own stack.
        #[arg(long = "tech")]
        technologies: Vec<String>,
    },

    /// Detect and recommend technologies for a document.
    TechStack {
        /// Document UUID.
        document_id: String,
    },

    /// List analyzed projects, most recent first.
    Projects,

    /// Print a project's full analysis as JSON.
    Show {
        /// Project UUID.
        project_id: String,
    },

    /// Generate (or regenerate) the task plan for one day.
    ///
    /// Unfinished tasks from the previous day are carried over into the
    /// new plan. Regenerating a day replaces its existing plan.
    Plan {
        /// Project UUID.
        project_id: String,

        /// Day number, starting at 1.
        #[arg(long)]
        day: i64,

        /// Target calendar date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,

        /// Working hours to plan for.
        #[arg(long, default_value_t = 8)]
        hours: i64,
    },

    /// Record which of a day's tasks are done.
    ///
    /// Reads a JSON array of completed tasks
    /// (`[{"task": "...", "estimated_hours": 2.5}]`). Tasks in the file
    /// are marked done; every other task on that day is marked not done.
    Report {
        /// Project UUID.
        project_id: String,

        /// Day number, starting at 1.
        #[arg(long)]
        day: i64,

        /// Path to the JSON file listing completed tasks.
        #[arg(long)]
        tasks_file: PathBuf,
    },

    /// Print a day's task plan.
    Log {
        /// Project UUID.
        project_id: String,

        /// Day number, starting at 1.
        #[arg(long)]
        day: i64,
    },

    /// Rank a document's chunks against a query.
    ///
    /// Requires an embedding provider to be configured and the document
    /// to have been ingested with embeddings.
    Search {
        /// Document UUID.
        document_id: String,

        /// The query string.
        query: String,

        /// Maximum number of chunks to return.
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let store = SqliteStore::connect(&cfg.db).await?;
    let user = cli.user.as_str();

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(store.pool()).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { file } => {
            let outcome = ingest::ingest_file(&store, &cfg, user, &file).await?;
            println!("Ingested {} as document {}", outcome.document.filename, outcome.document.id);
            println!(
                "  {} chunks, {} embedded",
                outcome.chunk_count, outcome.embedded_count
            );
        }
        Commands::Analyze {
            document_id,
            name,
            daily_hours,
            days_per_week,
            technologies,
        } => {
            let chat = MistralChat::new(cfg.llm.clone())?;
            let request = AnalysisRequest {
                project_name: name,
                daily_hours,
                working_days_per_week: days_per_week,
                technologies,
            };
            let project =
                analysis::analyze_project(&store, &chat, user, &document_id, &request).await?;
            println!("Project {} created", project.id);
            println!("{}", serde_json::to_string_pretty(&project.analysis)?);
        }
        Commands::TechStack { document_id } => {
            let chat = MistralChat::new(cfg.llm.clone())?;
            let report =
                analysis::extract_technology_stack(&store, &chat, user, &document_id).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Projects => {
            let projects = store.list_projects(user).await?;
            if projects.is_empty() {
                println!("No projects yet. Run `pw analyze <document-id>` first.");
            }
            for p in projects {
                let duration = p.total_duration_weeks.as_deref().unwrap_or("?");
                println!(
                    "{}  {}  [{} | {}]",
                    p.id, p.project_name, p.complexity_level, duration
                );
            }
        }
        Commands::Show { project_id } => {
            let project = store.get_project(user, &project_id).await?;
            println!("{}", serde_json::to_string_pretty(&project.analysis)?);
        }
        Commands::Plan {
            project_id,
            day,
            date,
            hours,
        } => {
            let target_date = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", d))?,
                None => chrono::Local::now().date_naive(),
            };
            let chat = MistralChat::new(cfg.llm.clone())?;
            let planner = DailyPlanner::new();
            let log = planner
                .generate_daily_plan(&store, &chat, user, &project_id, day, target_date, hours)
                .await?;
            print_daily_log(&log);
        }
        Commands::Report {
            project_id,
            day,
            tasks_file,
        } => {
            let raw = std::fs::read_to_string(&tasks_file)
                .with_context(|| format!("cannot read {}", tasks_file.display()))?;
            let completed: Vec<Task> =
                serde_json::from_str(&raw).context("tasks file must be a JSON array of tasks")?;
            let planner = DailyPlanner::new();
            let (log, summary) = planner
                .report_completion(&store, user, &project_id, day, &completed)
                .await?;
            println!(
                "Day {}: {} completed, {} remaining of {} tasks",
                log.day_number, summary.completed, summary.remaining, summary.total
            );
            print_daily_log(&log);
        }
        Commands::Log { project_id, day } => {
            let log = daily::get_daily_log(&store, user, &project_id, day).await?;
            print_daily_log(&log);
        }
        Commands::Search {
            document_id,
            query,
            limit,
        } => {
            if !cfg.embedding.is_enabled() {
                anyhow::bail!(
                    "Search requires an embedding provider. Set [embedding] in the config."
                );
            }
            let provider = embedding::create_provider(&cfg.embedding)?;
            let document = store.get_document(user, &document_id).await?;
            let chunks = store.get_chunks(&document.id).await?;
            let k = limit.unwrap_or(cfg.retrieval.top_k);
            let ranked =
                search::relevant_chunks(&cfg, provider.as_ref(), &query, &chunks, k).await?;
            if ranked.is_empty() {
                println!("No embedded chunks to search. Re-ingest with embeddings enabled.");
            }
            for scored in ranked {
                println!("[{:.4}] chunk {}", scored.score, scored.chunk.chunk_index);
                println!("{}\n", scored.chunk.text);
            }
        }
    }

    Ok(())
}

fn print_daily_log(log: &DailyLog) {
    println!(
        "Day {} ({}) — {} planned hours",
        log.day_number, log.target_date, log.planned_hours
    );
    for task in &log.tasks {
        let mark = if task.task_done { "x" } else { " " };
        println!("  [{}] {} ({}h)", mark, task.task, task.estimated_hours);
    }
}
