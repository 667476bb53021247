//! # Codesum Summarizer
//!
//! Concurrent pipeline turning code chunks into chunk, file and project summaries.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator
//!     │
//!     ├──> FilePlan: every file owned by exactly one worker (round-robin)
//!     │
//!     ├──> Bounded pool (semaphore) running one task per chunk
//!     │      └─> SummarizationWorker (owner of the chunk's file)
//!     │             ├─ DependencyResolver: call sites -> dependencies
//!     │             ├─ DependencyCache: method summary per dependency, computed once
//!     │             ├─ chunk summary
//!     │             └─ last chunk of a file -> file summary -> FileSummaryStore
//!     │
//!     └──> Project summary over all published file summaries
//! ```
//!
//! Text generation goes through [`TextGenerator`]. It never fails: once
//! retries are exhausted it returns an `Error: ...` sentinel, which is kept as
//! the summary so that one bad call degrades the output without aborting the run.

mod cache;
mod client;
mod config;
mod error;
pub mod llm;
mod orchestrator;
mod prompt_log;
pub mod prompts;
mod result;
mod stats;
mod worker;

pub use cache::DependencyCache;
pub use client::SummaryClient;
pub use config::{CacheMode, LlmConfig, Provider, SummarizerConfig};
pub use error::{Result, SummarizerError};
pub use llm::{
    build_generator, is_error_sentinel, CallPurpose, ChatMessage, Role, TextGenerator,
};
pub use orchestrator::{FilePlan, Orchestrator};
pub use prompt_log::PromptLog;
pub use result::ProjectResult;
pub use stats::{PipelineStats, StatsSnapshot};
pub use worker::{ChunkOutcome, ChunkRecord, FileSummaryStore, SummarizationWorker, WorkerShared};
