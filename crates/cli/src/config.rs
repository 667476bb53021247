use anyhow::{Context, Result};
use codesum_chunker::ChunkerConfig;
use codesum_summarizer::{LlmConfig, Provider, SummarizerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "codesum.toml";
pub const PROVIDER_ENV: &str = "CODESUM_LLM_PROVIDER";

/// Contents of `codesum.toml`; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub chunking: ChunkerConfig,
    pub project: ProjectConfig,
    pub summarizer: SummarizerConfig,
    pub llm: LlmConfig,
    pub output: OutputConfig,
}

/// Which files of the project are summarized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// File extensions without the dot
    pub extensions: Vec<String>,

    /// Glob patterns, matched against paths relative to the project root
    pub exclude: Vec<String>,

    pub include_tests: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["java".to_string()],
            exclude: vec![
                "**/target/**".to_string(),
                "**/build/**".to_string(),
                "**/.git/**".to_string(),
            ],
            include_tests: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub stats_dir: PathBuf,
    pub prompt_log_dir: PathBuf,

    /// Share of text-generation calls written to the prompt log; 0 disables it
    pub prompt_log_sample_percent: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stats_dir: PathBuf::from("stats"),
            prompt_log_dir: PathBuf::from("prompt_logs"),
            prompt_log_sample_percent: 80,
        }
    }
}

impl AppConfig {
    /// Load `path`, or `codesum.toml` from the working directory when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !required && !path.exists() {
            log::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(PROVIDER_ENV) {
            if !raw.trim().is_empty() {
                self.llm.provider = raw
                    .parse::<Provider>()
                    .with_context(|| format!("Invalid {PROVIDER_ENV}"))?;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.summarizer.validate()?;
        self.llm.validate()?;
        Ok(())
    }
}
