use crate::llm::{is_error_sentinel, CallPurpose, ChatMessage, TextGenerator};
use crate::prompt_log::PromptLog;
use crate::stats::PipelineStats;
use std::sync::Arc;

/// Text generator wrapped with call statistics and the optional prompt log
pub struct SummaryClient {
    generator: Arc<dyn TextGenerator>,
    stats: Arc<PipelineStats>,
    prompt_log: Option<PromptLog>,
}

impl SummaryClient {
    pub fn new(generator: Arc<dyn TextGenerator>, stats: Arc<PipelineStats>) -> Self {
        Self {
            generator,
            stats,
            prompt_log: None,
        }
    }

    #[must_use]
    pub fn with_prompt_log(mut self, prompt_log: PromptLog) -> Self {
        self.prompt_log = Some(prompt_log);
        self
    }

    pub fn stats(&self) -> &Arc<PipelineStats> {
        &self.stats
    }

    /// Send `prompt` as a single user message
    pub async fn summarize(&self, purpose: CallPurpose, prompt: String) -> String {
        self.stats.record_llm_call(purpose);
        let messages = vec![ChatMessage::user(prompt)];

        let response = self.generator.generate(messages.clone(), purpose).await;
        if is_error_sentinel(&response) {
            log::warn!("{purpose} degraded: {response}");
        }

        if let Some(prompt_log) = &self.prompt_log {
            prompt_log.record(purpose, &messages, &response);
        }
        response
    }
}
