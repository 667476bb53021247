use crate::error::Result;
use crate::llm::CallPurpose;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Counters shared by every worker of one pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    llm_calls: [AtomicUsize; 4],
    api_requests: AtomicUsize,
    dependency_extractions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    cache_contention_skips: AtomicUsize,
    dependencies_found: AtomicUsize,
    dependencies_resolved: AtomicUsize,
    timing: Mutex<Timing>,
}

#[derive(Debug, Default)]
struct Timing {
    started: Option<Instant>,
    finished: Option<Instant>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_llm_call(&self, purpose: CallPurpose) {
        self.llm_calls[purpose.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// One raw backend attempt, retries included
    pub fn record_api_request(&self) {
        self.api_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dependency_extraction(&self) {
        self.dependency_extractions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_contention(&self) {
        self.cache_contention_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dependencies(&self, found: usize, resolved: usize) {
        self.dependencies_found.fetch_add(found, Ordering::Relaxed);
        self.dependencies_resolved.fetch_add(resolved, Ordering::Relaxed);
    }

    pub fn start_timing(&self) {
        if let Ok(mut timing) = self.timing.lock() {
            timing.started = Some(Instant::now());
            timing.finished = None;
        }
    }

    pub fn end_timing(&self) {
        if let Ok(mut timing) = self.timing.lock() {
            timing.finished = Some(Instant::now());
        }
    }

    pub fn snapshot(&self, project: &str) -> StatsSnapshot {
        let llm_calls: BTreeMap<String, usize> = CallPurpose::ALL
            .iter()
            .map(|p| {
                let count = self.llm_calls[p.index()].load(Ordering::Relaxed);
                (p.as_str().to_string(), count)
            })
            .collect();
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let dependencies_found = self.dependencies_found.load(Ordering::Relaxed);
        let dependencies_resolved = self.dependencies_resolved.load(Ordering::Relaxed);

        let total_time_seconds = match self.timing.lock() {
            Ok(timing) => match (timing.started, timing.finished) {
                (Some(start), Some(end)) => end.duration_since(start).as_secs_f64(),
                _ => 0.0,
            },
            Err(_) => 0.0,
        };

        StatsSnapshot {
            project: project.to_string(),
            total_llm_calls: llm_calls.values().sum(),
            llm_calls,
            api_requests: self.api_requests.load(Ordering::Relaxed),
            dependency_extractions: self.dependency_extractions.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            cache_contention_skips: self.cache_contention_skips.load(Ordering::Relaxed),
            cache_hit_rate: ratio(cache_hits, cache_hits + cache_misses),
            dependencies_found,
            dependencies_resolved,
            dependency_resolution_rate: ratio(dependencies_resolved, dependencies_found),
            total_time_seconds,
        }
    }

    /// Write `{dir}/{project}_stats.json`, creating `dir` if needed
    pub fn export(&self, dir: &Path, project: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{project}_stats.json"));
        let json = serde_json::to_string_pretty(&self.snapshot(project))?;
        std::fs::write(&path, json)?;
        log::info!("Statistics written to {}", path.display());
        Ok(path)
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Serializable point-in-time view of [`PipelineStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub project: String,
    pub llm_calls: BTreeMap<String, usize>,
    pub total_llm_calls: usize,
    pub api_requests: usize,
    pub dependency_extractions: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_contention_skips: usize,
    pub cache_hit_rate: f64,
    pub dependencies_found: usize,
    pub dependencies_resolved: usize,
    pub dependency_resolution_rate: f64,
    pub total_time_seconds: f64,
}

impl StatsSnapshot {
    pub fn llm_calls_for(&self, purpose: CallPurpose) -> usize {
        self.llm_calls.get(purpose.as_str()).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_derives_rates() {
        let stats = PipelineStats::new();
        stats.record_llm_call(CallPurpose::ChunkSummary);
        stats.record_llm_call(CallPurpose::ChunkSummary);
        stats.record_llm_call(CallPurpose::ProjectSummary);
        stats.record_cache_hit();
        stats.record_cache_miss();
        stats.record_cache_miss();
        stats.record_cache_miss();
        stats.record_dependencies(4, 1);

        let snap = stats.snapshot("demo");
        assert_eq!(snap.total_llm_calls, 3);
        assert_eq!(snap.llm_calls_for(CallPurpose::ChunkSummary), 2);
        assert_eq!(snap.llm_calls_for(CallPurpose::MethodSummary), 0);
        assert_eq!(snap.cache_hit_rate, 0.25);
        assert_eq!(snap.dependency_resolution_rate, 0.25);
        assert_eq!(snap.total_time_seconds, 0.0);
    }

    #[test]
    fn empty_stats_have_zero_rates() {
        let snap = PipelineStats::new().snapshot("empty");
        assert_eq!(snap.cache_hit_rate, 0.0);
        assert_eq!(snap.dependency_resolution_rate, 0.0);
        assert_eq!(snap.llm_calls.len(), 4);
    }

    #[test]
    fn export_writes_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let stats = PipelineStats::new();
        stats.start_timing();
        stats.record_api_request();
        stats.end_timing();

        let path = stats.export(&dir.path().join("stats"), "shop").unwrap();
        assert_eq!(path, dir.path().join("stats").join("shop_stats.json"));

        let written: StatsSnapshot =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.project, "shop");
        assert_eq!(written.api_requests, 1);
    }
}
