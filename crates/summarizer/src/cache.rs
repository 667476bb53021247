use crate::config::CacheMode;
use crate::stats::PipelineStats;
use codesum_graph::Dependency;
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OnceCell;

/// Deduplicating store of dependency context, keyed by dependency identity
///
/// Entries are written at most once and never invalidated. In
/// [`CacheMode::SkipInFlight`] a caller that finds its key being computed by
/// someone else gets `None` straight away; in [`CacheMode::AwaitInFlight`] it
/// waits for that computation and shares the result.
pub struct DependencyCache {
    mode: CacheMode,
    state: Mutex<CacheState>,
    stats: Option<Arc<PipelineStats>>,
}

#[derive(Default)]
struct CacheState {
    values: HashMap<Dependency, String>,
    in_flight: HashSet<Dependency>,
    cells: HashMap<Dependency, Arc<OnceCell<String>>>,
}

/// Clears the in-flight marker even if the computation is dropped mid-way
struct InFlight<'a> {
    cache: &'a DependencyCache,
    key: &'a Dependency,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.lock().in_flight.remove(self.key);
    }
}

impl DependencyCache {
    pub fn new(mode: CacheMode) -> Self {
        Self {
            mode,
            state: Mutex::new(CacheState::default()),
            stats: None,
        }
    }

    #[must_use]
    pub fn with_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `key`, computing it on a miss
    ///
    /// A failed computation is logged and yields `None`; it is not cached, so
    /// a later caller may try again.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &Dependency, compute: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
    {
        match self.mode {
            CacheMode::SkipInFlight => self.skip_in_flight(key, compute).await,
            CacheMode::AwaitInFlight => self.await_in_flight(key, compute).await,
        }
    }

    async fn skip_in_flight<F, Fut, E>(&self, key: &Dependency, compute: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
    {
        {
            let mut state = self.lock();
            if let Some(value) = state.values.get(key).cloned() {
                self.with_stats_do(PipelineStats::record_cache_hit);
                return Some(value);
            }
            if !state.in_flight.insert(key.clone()) {
                self.with_stats_do(PipelineStats::record_cache_contention);
                log::debug!("Context for {key} is being computed elsewhere, skipping");
                return None;
            }
        }

        self.with_stats_do(PipelineStats::record_cache_miss);
        let _in_flight = InFlight { cache: self, key };

        match compute().await {
            Ok(value) => {
                self.lock()
                    .values
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
                Some(value)
            }
            Err(e) => {
                log::warn!("Context for {key} unavailable: {e}");
                None
            }
        }
    }

    async fn await_in_flight<F, Fut, E>(&self, key: &Dependency, compute: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
    {
        let cell = self.lock().cells.entry(key.clone()).or_default().clone();

        if let Some(value) = cell.get() {
            self.with_stats_do(PipelineStats::record_cache_hit);
            return Some(value.clone());
        }

        let mut computed = false;
        let result = cell
            .get_or_try_init(|| {
                computed = true;
                compute()
            })
            .await;

        if computed {
            self.with_stats_do(PipelineStats::record_cache_miss);
        } else {
            self.with_stats_do(PipelineStats::record_cache_hit);
        }

        match result {
            Ok(value) => Some(value.clone()),
            Err(e) => {
                log::warn!("Context for {key} unavailable: {e}");
                None
            }
        }
    }

    fn with_stats_do(&self, record: fn(&PipelineStats)) {
        if let Some(stats) = &self.stats {
            record(stats);
        }
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        let state = self.lock();
        state.values.len() + state.cells.values().filter(|c| c.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
