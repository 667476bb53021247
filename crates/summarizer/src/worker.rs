use crate::cache::DependencyCache;
use crate::client::SummaryClient;
use crate::error::SummarizerError;
use crate::llm::CallPurpose;
use crate::prompts;
use crate::stats::PipelineStats;
use codesum_chunker::CodeChunk;
use codesum_graph::{Dependency, DependencyResolver};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Thread-safe map of published file summaries, keyed by file path
#[derive(Debug, Default)]
pub struct FileSummaryStore {
    summaries: Mutex<BTreeMap<String, String>>,
}

impl FileSummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.summaries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, file_path: &str, summary: String) {
        self.lock().insert(file_path.to_string(), summary);
    }

    pub fn get(&self, file_path: &str) -> Option<String> {
        self.lock().get(file_path).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All published summaries, ordered by path
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }
}

/// Collaborators shared by every worker of one run
pub struct WorkerShared {
    pub resolver: Arc<DependencyResolver>,
    pub cache: Arc<DependencyCache>,
    pub client: Arc<SummaryClient>,
    pub file_summaries: Arc<FileSummaryStore>,
    pub max_dependency_context: usize,
}

impl WorkerShared {
    fn stats(&self) -> &PipelineStats {
        self.client.stats()
    }
}

/// One chunk's summary with its line range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub summary: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Result of processing one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub file_path: String,
    pub chunk_summary: String,

    /// Set when this chunk completed its file
    pub file_summary: Option<String>,
}

#[derive(Default)]
struct WorkerState {
    expected: HashMap<String, usize>,
    files: HashMap<String, Vec<ChunkRecord>>,
}

/// Summarizes chunks and aggregates each file's chunk summaries once all of
/// them have arrived
///
/// Per-file state is private to the worker. Every chunk of a given file must
/// go to the same worker.
pub struct SummarizationWorker {
    id: usize,
    shared: Arc<WorkerShared>,
    state: Mutex<WorkerState>,
}

impl SummarizationWorker {
    pub fn new(id: usize, shared: Arc<WorkerShared>) -> Self {
        Self {
            id,
            shared,
            state: Mutex::new(WorkerState::default()),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Declare how many chunks each file will produce. Files never declared
    /// are expected to have a single chunk.
    pub fn expect_chunks<'a>(&self, counts: impl IntoIterator<Item = (&'a str, usize)>) {
        let mut state = self.lock();
        for (file_path, count) in counts {
            state.expected.insert(file_path.to_string(), count);
        }
    }

    fn expected_chunks(state: &WorkerState, file_path: &str) -> usize {
        state.expected.get(file_path).copied().unwrap_or(1)
    }

    pub async fn process_chunk(&self, chunk: &CodeChunk) -> ChunkOutcome {
        let context = self.gather_dependency_context(chunk).await;
        let language = self.shared.resolver.analyzer().language_name();
        let chunk_summary = self
            .shared
            .client
            .summarize(
                CallPurpose::ChunkSummary,
                prompts::chunk(language, &chunk.content, &context),
            )
            .await;

        let completed = {
            let mut state = self.lock();
            let expected = Self::expected_chunks(&state, &chunk.file_path);
            let records = state.files.entry(chunk.file_path.clone()).or_default();
            records.push(ChunkRecord {
                summary: chunk_summary.clone(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
            });

            if records.len() == expected {
                state.files.remove(&chunk.file_path)
            } else {
                None
            }
        };

        let file_summary = match completed {
            Some(records) => Some(self.summarize_file(&chunk.file_path, records).await),
            None => None,
        };

        ChunkOutcome {
            file_path: chunk.file_path.clone(),
            chunk_summary,
            file_summary,
        }
    }

    async fn summarize_file(&self, file_path: &str, mut records: Vec<ChunkRecord>) -> String {
        records.sort_by_key(|r| r.start_line);
        let summaries: Vec<String> = records.into_iter().map(|r| r.summary).collect();

        let summary = self
            .shared
            .client
            .summarize(CallPurpose::FileSummary, prompts::file(&summaries, file_path))
            .await;

        self.shared.file_summaries.publish(file_path, summary.clone());
        log::info!(
            "Worker {}: completed file summary for {file_path} ({} chunks)",
            self.id,
            summaries.len()
        );
        summary
    }

    /// Newline-joined summaries of the chunk's resolved dependencies
    async fn gather_dependency_context(&self, chunk: &CodeChunk) -> String {
        let scan = self.shared.resolver.find_dependencies(chunk);
        self.shared
            .stats()
            .record_dependencies(scan.call_sites, scan.dependencies.len());

        let mut parts = Vec::new();
        for dep in scan
            .dependencies
            .iter()
            .take(self.shared.max_dependency_context)
        {
            let context = self
                .shared
                .cache
                .get_or_compute(dep, || self.summarize_dependency(dep))
                .await;

            if let Some(text) = context.filter(|t| !t.is_empty()) {
                parts.push(text);
            }
        }

        log::debug!(
            "{}:{}-{}: {} of {} dependencies contributed context",
            chunk.file_path,
            chunk.start_line,
            chunk.end_line,
            parts.len(),
            scan.dependencies.len()
        );
        parts.join("\n")
    }

    async fn summarize_dependency(&self, dep: &Dependency) -> Result<String, SummarizerError> {
        self.shared.stats().record_dependency_extraction();
        let resolver = &self.shared.resolver;

        let method_source = resolver.extract_method(&dep.file_path, &dep.method_name);
        if method_source.is_empty() {
            return Err(SummarizerError::MethodSourceMissing(dep.to_string()));
        }

        let language = resolver.analyzer().language_name();
        Ok(self
            .shared
            .client
            .summarize(
                CallPurpose::MethodSummary,
                prompts::method(language, &method_source, &dep.file_path, &dep.method_name),
            )
            .await)
    }
}
