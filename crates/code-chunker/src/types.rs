use serde::{Deserialize, Serialize};

/// A window of source lines with file-level metadata attached
///
/// Line numbers are 0-indexed and half-open: the chunk covers
/// `start_line..end_line` of the file's `\n`-separated lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CodeChunk {
    /// Source file path
    pub file_path: String,

    /// The lines of the window joined with `\n`
    pub content: String,

    /// First line (0-indexed, inclusive)
    pub start_line: usize,

    /// End line (0-indexed, exclusive)
    pub end_line: usize,

    /// Imports declared by the file, in declaration order
    pub imports: Vec<String>,

    /// First type declared by the file
    pub enclosing_type: Option<String>,
}

impl CodeChunk {
    /// Create a new code chunk
    #[must_use]
    pub fn new(
        file_path: String,
        content: String,
        start_line: usize,
        end_line: usize,
        metadata: FileMetadata,
    ) -> Self {
        Self {
            file_path,
            content,
            start_line,
            end_line,
            imports: metadata.imports,
            enclosing_type: metadata.enclosing_type,
        }
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line)
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line < self.end_line
    }
}

/// Metadata computed once per file and shared by all of its chunks
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub imports: Vec<String>,
    pub enclosing_type: Option<String>,
}
