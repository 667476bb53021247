use crate::error::{Result, SummarizerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a cache caller does when another caller is already computing its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Return no context immediately and let the first caller finish alone
    #[default]
    SkipInFlight,

    /// Wait for the in-flight computation and share its result
    AwaitInFlight,
}

/// Pipeline sizing and dependency-context limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Number of summarization workers files are partitioned across
    pub worker_count: usize,

    /// Maximum number of chunk tasks running at once
    pub pool_size: usize,

    /// Dependencies per chunk that contribute context; extras are ignored
    pub max_dependency_context: usize,

    pub cache_mode: CacheMode,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            pool_size: 10,
            max_dependency_context: 10,
            cache_mode: CacheMode::SkipInFlight,
        }
    }
}

impl SummarizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(SummarizerError::invalid_config("worker_count must be > 0"));
        }
        if self.pool_size == 0 {
            return Err(SummarizerError::invalid_config("pool_size must be > 0"));
        }
        Ok(())
    }
}

/// Text-generation service selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    OpenAi,
    /// Offline backend echoing a prefix of each prompt
    Stub,
}

impl Provider {
    pub fn default_api_key_env(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Stub => "",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-haiku-20241022",
            Self::OpenAi => "gpt-4o-mini",
            Self::Stub => "stub",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = SummarizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "stub" => Ok(Self::Stub),
            other => Err(SummarizerError::invalid_config(format!(
                "unknown provider '{other}' (expected anthropic, openai or stub)"
            ))),
        }
    }
}

/// Text-generation request and retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,

    /// Model name; empty selects the provider default
    pub model: String,

    pub max_tokens: u32,
    pub temperature: f32,

    /// Attempts per call before the error sentinel is returned
    pub max_attempts: u32,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Environment variable holding the API key; empty selects the provider default
    pub api_key_env: String,

    /// Override for the provider endpoint
    pub base_url: Option<String>,

    /// Characters echoed by the stub provider
    pub stub_echo_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Anthropic,
            model: String::new(),
            max_tokens: 4000,
            temperature: 0.0,
            max_attempts: 10,
            timeout_secs: 60,
            api_key_env: String::new(),
            base_url: None,
            stub_echo_chars: 10,
        }
    }
}

impl LlmConfig {
    pub fn model_name(&self) -> &str {
        if self.model.trim().is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    pub fn api_key_var(&self) -> &str {
        if self.api_key_env.trim().is_empty() {
            self.provider.default_api_key_env()
        } else {
            &self.api_key_env
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(SummarizerError::invalid_config("max_attempts must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(SummarizerError::invalid_config("timeout_secs must be > 0"));
        }
        Ok(())
    }
}
