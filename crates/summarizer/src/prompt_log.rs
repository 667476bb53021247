use crate::llm::{CallPurpose, ChatMessage};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const LOG_FILE_NAME: &str = "prompts.jsonl";

#[derive(Serialize)]
struct PromptEntry<'a> {
    prompt_type: CallPurpose,
    messages: &'a [ChatMessage],
    response: &'a str,
}

/// Sampled JSON-lines record of prompts and responses
///
/// Write failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct PromptLog {
    path: PathBuf,
    sample_percent: u8,
    write_lock: Mutex<()>,
}

impl PromptLog {
    pub fn new(dir: impl AsRef<Path>, sample_percent: u8) -> Self {
        Self {
            path: dir.as_ref().join(LOG_FILE_NAME),
            sample_percent: sample_percent.min(100),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn should_log(&self) -> bool {
        match self.sample_percent {
            0 => false,
            100 => true,
            percent => random_percentile().is_some_and(|p| p < u16::from(percent)),
        }
    }

    pub fn record(&self, purpose: CallPurpose, messages: &[ChatMessage], response: &str) {
        if !self.should_log() {
            return;
        }

        let entry = PromptEntry {
            prompt_type: purpose,
            messages,
            response,
        };
        if let Err(e) = self.append(&entry) {
            log::warn!("Failed to write prompt log {}: {e}", self.path.display());
        }
    }

    fn append(&self, entry: &PromptEntry<'_>) -> std::io::Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| std::io::Error::other("prompt log lock poisoned"))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

/// Largest multiple of 100 representable in a `u16`
const DRAW_LIMIT: u16 = 65_500;

/// Uniform value in `0..100`; draws at or above [`DRAW_LIMIT`] are rejected
fn percentile(draw: u16) -> Option<u16> {
    (draw < DRAW_LIMIT).then_some(draw % 100)
}

fn random_percentile() -> Option<u16> {
    loop {
        let mut bytes = [0u8; 2];
        getrandom::getrandom(&mut bytes).ok()?;
        if let Some(p) = percentile(u16::from_le_bytes(bytes)) {
            return Some(p);
        }
    }
}
