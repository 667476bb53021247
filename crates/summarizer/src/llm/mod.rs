//! Text-generation collaborator contract and its backends.
//!
//! Callers only see [`TextGenerator`], which never fails: once the retry
//! budget is spent it returns an error sentinel (text starting with
//! `Error:`) that flows through the pipeline like any other summary.

mod anthropic;
mod openai;
mod retry;
mod stub;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;
pub use retry::{RetryPolicy, RetryingGenerator};
pub use stub::StubBackend;

use crate::config::{LlmConfig, Provider};
use crate::error::{Result, SummarizerError};
use crate::stats::PipelineStats;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Prefix shared by every error sentinel
pub const ERROR_SENTINEL_PREFIX: &str = "Error:";

/// Whether a generated text is an error sentinel rather than a summary
pub fn is_error_sentinel(text: &str) -> bool {
    text.starts_with(ERROR_SENTINEL_PREFIX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role-tagged message of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Why a text-generation call is made; only used for statistics and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPurpose {
    ChunkSummary,
    MethodSummary,
    FileSummary,
    ProjectSummary,
}

impl CallPurpose {
    pub const ALL: [CallPurpose; 4] = [
        Self::ChunkSummary,
        Self::MethodSummary,
        Self::FileSummary,
        Self::ProjectSummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChunkSummary => "chunk_summary",
            Self::MethodSummary => "method_summary",
            Self::FileSummary => "file_summary",
            Self::ProjectSummary => "project_summary",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::ChunkSummary => 0,
            Self::MethodSummary => 1,
            Self::FileSummary => 2,
            Self::ProjectSummary => 3,
        }
    }
}

impl fmt::Display for CallPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a prompt into generated text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a response. Failures come back as an error sentinel, never as `Err`.
    async fn generate(&self, messages: Vec<ChatMessage>, purpose: CallPurpose) -> String;
}

/// Failure of a single backend attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The service asked us to slow down (HTTP 429)
    RateLimited,
    /// Any other non-success HTTP status
    Status { code: u16, body: String },
    /// Connection, TLS or timeout failure
    Transport(String),
    /// The response body did not have the expected shape
    Decode(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::Status { code, body } => write!(f, "HTTP {code}: {body}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// A single request/response round trip, without retries
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> std::result::Result<String, BackendError>;
}

/// Classify a non-success HTTP response
pub(crate) async fn status_error(response: reqwest::Response) -> BackendError {
    let code = response.status().as_u16();
    if code == 429 {
        return BackendError::RateLimited;
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    BackendError::Status { code, body }
}

/// Build the retrying generator for the configured provider
pub fn build_generator(
    config: &LlmConfig,
    stats: Option<Arc<PipelineStats>>,
) -> Result<Arc<dyn TextGenerator>> {
    config.validate()?;
    let policy = RetryPolicy::new(config.max_attempts);

    let generator: Arc<dyn TextGenerator> = match config.provider {
        Provider::Anthropic => Arc::new(
            RetryingGenerator::new(AnthropicBackend::new(config, read_api_key(config)?)?, policy)
                .with_stats(stats),
        ),
        Provider::OpenAi => Arc::new(
            RetryingGenerator::new(OpenAiBackend::new(config, read_api_key(config)?)?, policy)
                .with_stats(stats),
        ),
        Provider::Stub => Arc::new(
            RetryingGenerator::new(StubBackend::new(config.stub_echo_chars), policy)
                .with_stats(stats),
        ),
    };

    log::info!(
        "Text generation: provider {:?}, model {}",
        config.provider,
        config.model_name()
    );
    Ok(generator)
}

fn read_api_key(config: &LlmConfig) -> Result<String> {
    let var = config.api_key_var();
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| SummarizerError::MissingApiKey(var.to_string()))
}
