use super::{BackendError, CallPurpose, ChatMessage, CompletionBackend, TextGenerator};
use crate::stats::PipelineStats;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Exponential backoff: attempt `n` waits `2^n + jitter` units, jitter in `[0, 1)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_unit: Duration::from_secs(1),
            jitter: true,
        }
    }

    #[must_use]
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Wait before the retry that follows `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = 2f64.powi(attempt.min(30) as i32);
        let jitter = if self.jitter { unit_jitter() } else { 0.0 };
        self.backoff_unit.mul_f64(base + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Uniform value in `[0, 1)`; zero when the OS RNG is unavailable
fn unit_jitter() -> f64 {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        return 0.0;
    }
    (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
}

/// [`TextGenerator`] that retries a [`CompletionBackend`] with backoff
pub struct RetryingGenerator<B> {
    backend: B,
    policy: RetryPolicy,
    stats: Option<Arc<PipelineStats>>,
}

impl<B: CompletionBackend> RetryingGenerator<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            stats: None,
        }
    }

    /// Count every backend attempt in `stats`
    #[must_use]
    pub fn with_stats(mut self, stats: Option<Arc<PipelineStats>>) -> Self {
        self.stats = stats;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: CompletionBackend> TextGenerator for RetryingGenerator<B> {
    async fn generate(&self, messages: Vec<ChatMessage>, purpose: CallPurpose) -> String {
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            if let Some(stats) = &self.stats {
                stats.record_api_request();
            }

            match self.backend.complete(&messages).await {
                Ok(text) => return text,
                Err(BackendError::RateLimited) => {
                    let wait = self.policy.delay(attempt);
                    log::warn!(
                        "Rate limited ({purpose}), waiting {:.1} seconds...",
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    if attempt + 1 == max_attempts {
                        return format!(
                            "Error: Failed to get response after {max_attempts} attempts: {e}"
                        );
                    }
                    let wait = self.policy.delay(attempt);
                    log::warn!(
                        "Request failed ({purpose}, attempt {}), retrying in {:.1}s: {e}",
                        attempt + 1,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }

        "Error: Max retries exceeded".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, BackendError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(BackendError::RateLimited))
        }
    }

    fn generator(
        max_attempts: u32,
        replies: Vec<Result<String, BackendError>>,
    ) -> RetryingGenerator<ScriptedBackend> {
        RetryingGenerator::new(
            ScriptedBackend::new(replies),
            RetryPolicy::new(max_attempts).without_jitter(),
        )
        .with_stats(Some(Arc::new(PipelineStats::new())))
    }

    fn server_error() -> BackendError {
        BackendError::Status {
            code: 500,
            body: "overloaded".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_back_off_exponentially_then_succeed() {
        let gen = generator(
            10,
            vec![
                Err(BackendError::RateLimited),
                Err(BackendError::RateLimited),
                Ok("summary".to_string()),
            ],
        );

        let started = Instant::now();
        let text = gen
            .generate(vec![ChatMessage::user("x")], CallPurpose::ChunkSummary)
            .await;

        assert_eq!(text, "summary");
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2));
        assert_eq!(gen.stats.as_ref().unwrap().snapshot("p").api_requests, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_rate_limits_return_max_retries_sentinel() {
        let gen = generator(3, Vec::new());

        let started = Instant::now();
        let text = gen
            .generate(vec![ChatMessage::user("x")], CallPurpose::FileSummary)
            .await;

        assert_eq!(text, "Error: Max retries exceeded");
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn other_failures_return_attempt_sentinel_without_final_wait() {
        let gen = generator(
            3,
            vec![Err(server_error()), Err(server_error()), Err(server_error())],
        );

        let started = Instant::now();
        let text = gen
            .generate(vec![ChatMessage::user("x")], CallPurpose::MethodSummary)
            .await;

        assert_eq!(
            text,
            "Error: Failed to get response after 3 attempts: HTTP 500: overloaded"
        );
        assert!(crate::llm::is_error_sentinel(&text));
        assert_eq!(started.elapsed(), Duration::from_secs(1 + 2));
    }

    #[test]
    fn jittered_delay_stays_below_next_power() {
        let policy = RetryPolicy::new(5).with_backoff_unit(Duration::from_millis(10));
        for attempt in 0..5 {
            let delay = policy.delay(attempt);
            let floor = Duration::from_millis(10 * (1 << attempt));
            assert!(delay >= floor && delay < floor + Duration::from_millis(10));
        }
    }
}
