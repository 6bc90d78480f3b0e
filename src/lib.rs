//! # Planwise
//!
//! A local-first project planning assistant. Planwise ingests project
//! documents (PDF or plain text), analyzes them with an LLM into a
//! structured estimate and task breakdown, and turns that analysis into
//! day-by-day task plans with carryover and completion tracking.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────┐
//! │ PDF/TXT  │──▶│  Pipeline     │──▶│  SQLite   │
//! │ upload   │   │ Chunk+Embed  │   │          │
//! └──────────┘   └──────────────┘   └────┬─────┘
//!                                        │
//!                    ┌───────────────────┤
//!                    ▼                   ▼
//!               ┌──────────┐       ┌──────────┐
//!               │ Analysis │       │  Daily   │
//!               │ (LLM)    │       │  plans   │
//!               └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pw init                        # create database
//! pw ingest ./docs/project.pdf   # upload a project document
//! pw analyze <document-id>       # run the LLM analysis
//! pw plan <project-id> --day 1   # generate day 1 tasks
//! pw report <project-id> --day 1 --tasks-file done.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF and text extraction |
//! | [`chunk`] | Paragraph-boundary chunking |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`search`] | Similarity ranking over chunks |
//! | [`ingest`] | Document ingestion pipeline |
//! | [`llm`] | Chat-completion client |
//! | [`jsonx`] | Lenient JSON extraction from LLM responses |
//! | [`analysis`] | LLM project analysis |
//! | [`daily`] | Day-by-day planning and completion |
//! | [`store`] | Storage abstraction (SQLite, in-memory) |
//! | [`migrate`] | Schema migrations |

pub mod analysis;
pub mod chunk;
pub mod config;
pub mod daily;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod jsonx;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod search;
pub mod store;
