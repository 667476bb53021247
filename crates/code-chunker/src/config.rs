use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for line-window chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Number of lines in a tentative window
    pub window_size: usize,

    /// Lines shared between consecutive windows of the same file
    pub overlap_size: usize,

    /// Interior windows shorter than this are skipped
    pub min_chunk_size: usize,

    /// Pull window ends back to block or declaration boundaries
    pub respect_boundaries: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_size: 500,
            overlap_size: 50,
            min_chunk_size: 10,
            respect_boundaries: true,
        }
    }
}

impl ChunkerConfig {
    /// Fixed windows with no boundary adjustment
    pub fn fixed(window_size: usize, overlap_size: usize) -> Self {
        Self {
            window_size,
            overlap_size,
            min_chunk_size: 0,
            respect_boundaries: false,
        }
    }

    /// Lines the cursor moves when an undersized interior window is skipped
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.window_size.saturating_sub(self.overlap_size)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(ChunkerError::invalid_config("window_size must be > 0"));
        }

        if self.overlap_size >= self.window_size {
            return Err(ChunkerError::invalid_config(format!(
                "overlap_size ({}) must be smaller than window_size ({})",
                self.overlap_size, self.window_size
            )));
        }

        if self.min_chunk_size > self.window_size {
            return Err(ChunkerError::invalid_config(format!(
                "min_chunk_size ({}) cannot exceed window_size ({})",
                self.min_chunk_size, self.window_size
            )));
        }

        Ok(())
    }
}
