use crate::cache::DependencyCache;
use crate::client::SummaryClient;
use crate::config::SummarizerConfig;
use crate::error::Result;
use crate::llm::CallPurpose;
use crate::prompts;
use crate::result::ProjectResult;
use crate::worker::{FileSummaryStore, SummarizationWorker, WorkerShared};
use codesum_chunker::{Chunker, CodeChunk, SourceProvider};
use codesum_graph::DependencyResolver;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const PROGRESS_EVERY: usize = 10;

/// Which worker owns which file, and how many chunks each file has
///
/// Files are numbered in order of first appearance and assigned round-robin,
/// so the assignment depends only on the chunk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePlan {
    counts: Vec<(String, usize)>,
    owners: HashMap<String, usize>,
}

impl FilePlan {
    pub fn new(chunks: &[CodeChunk], worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for chunk in chunks {
            let next = counts.len();
            let position = *positions.entry(chunk.file_path.clone()).or_insert(next);
            if position == next {
                counts.push((chunk.file_path.clone(), 0));
            }
            counts[position].1 += 1;
        }

        let owners = positions
            .into_iter()
            .map(|(path, position)| (path, position % worker_count))
            .collect();

        Self { counts, owners }
    }

    /// Worker index owning `file_path`
    pub fn owner(&self, file_path: &str) -> Option<usize> {
        self.owners.get(file_path).copied()
    }

    /// `(file, chunk count)` in order of first appearance
    pub fn counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(path, n)| (path.as_str(), *n))
    }

    pub fn file_count(&self) -> usize {
        self.counts.len()
    }
}

/// Runs the whole pipeline: chunk, index, dispatch, aggregate, summarize the project
pub struct Orchestrator {
    config: SummarizerConfig,
    chunker: Chunker,
    source: Arc<dyn SourceProvider>,
    client: Arc<SummaryClient>,
}

impl Orchestrator {
    pub fn new(
        config: SummarizerConfig,
        chunker: Chunker,
        source: Arc<dyn SourceProvider>,
        client: Arc<SummaryClient>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            chunker,
            source,
            client,
        })
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Summarize `files` of the project at `project_path`
    pub async fn run(&self, project_path: &str, files: &[String]) -> Result<ProjectResult> {
        let stats = self.client.stats().clone();
        stats.start_timing();

        let result = match self.prepare(files).await {
            Ok((chunks, resolver)) => {
                self.summarize_chunks(project_path, chunks, files.len(), Arc::new(resolver))
                    .await
            }
            Err(e) => Err(e),
        };
        stats.end_timing();
        result
    }

    /// Chunk and index on the blocking pool; both read every file
    async fn prepare(&self, files: &[String]) -> Result<(Vec<CodeChunk>, DependencyResolver)> {
        let chunker = self.chunker.clone();
        let source = self.source.clone();
        let files = files.to_vec();

        let prepared = tokio::task::spawn_blocking(move || {
            let chunks = chunker.chunk_files(&files, source.as_ref());
            let resolver =
                DependencyResolver::build(&files, source.as_ref(), chunker.analyzer().clone());
            (chunks, resolver)
        })
        .await?;
        Ok(prepared)
    }

    /// Dispatch already-chunked input and build the project result
    pub async fn summarize_chunks(
        &self,
        project_path: &str,
        chunks: Vec<CodeChunk>,
        total_files: usize,
        resolver: Arc<DependencyResolver>,
    ) -> Result<ProjectResult> {
        let plan = FilePlan::new(&chunks, self.config.worker_count);
        let shared = Arc::new(WorkerShared {
            resolver,
            cache: Arc::new(
                DependencyCache::new(self.config.cache_mode)
                    .with_stats(self.client.stats().clone()),
            ),
            client: self.client.clone(),
            file_summaries: Arc::new(FileSummaryStore::new()),
            max_dependency_context: self.config.max_dependency_context,
        });

        let workers: Vec<Arc<SummarizationWorker>> = (0..self.config.worker_count)
            .map(|id| {
                let worker = SummarizationWorker::new(id, shared.clone());
                worker.expect_chunks(plan.counts());
                Arc::new(worker)
            })
            .collect();

        let total_chunks = chunks.len();
        log::info!(
            "Dispatching {total_chunks} chunks from {} files to {} workers (pool size {})",
            plan.file_count(),
            workers.len(),
            self.config.pool_size
        );

        let pool = Arc::new(Semaphore::new(self.config.pool_size));
        let mut tasks = JoinSet::new();
        for chunk in chunks {
            let worker = workers[plan.owner(&chunk.file_path).unwrap_or(0)].clone();
            let pool = pool.clone();
            tasks.spawn(async move {
                let _permit = pool.acquire_owned().await;
                worker.process_chunk(&chunk).await
            });
        }

        let mut processed = 0;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined?;
            processed += 1;
            if outcome.file_summary.is_some() {
                log::debug!("File {} complete", outcome.file_path);
            }
            if processed % PROGRESS_EVERY == 0 {
                log::info!("Processed {processed}/{total_chunks} chunks");
            }
        }

        let file_summaries = shared.file_summaries.snapshot();
        let summaries: Vec<String> = file_summaries.values().cloned().collect();
        let project_summary = self
            .client
            .summarize(
                CallPurpose::ProjectSummary,
                prompts::project(&summaries, project_path),
            )
            .await;
        log::info!(
            "Project summary generated from {} file summaries",
            summaries.len()
        );

        Ok(ProjectResult {
            project_summary,
            file_summaries,
            total_files,
            total_chunks,
            project_path: project_path.to_string(),
        })
    }
}
