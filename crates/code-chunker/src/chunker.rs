use crate::analyzer::{JavaHeuristics, SourceAnalyzer};
use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::source::SourceProvider;
use crate::types::{CodeChunk, FileMetadata};
use std::sync::Arc;

/// Splits files into overlapping line windows
#[derive(Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    analyzer: Arc<dyn SourceAnalyzer>,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig, analyzer: Arc<dyn SourceAnalyzer>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, analyzer })
    }

    /// Chunker using the bundled Java heuristics
    pub fn java(config: ChunkerConfig) -> Result<Self> {
        Self::new(config, Arc::new(JavaHeuristics::new()))
    }

    /// Chunk every file, skipping (and logging) the ones that cannot be read
    pub fn chunk_files(&self, files: &[String], source: &dyn SourceProvider) -> Vec<CodeChunk> {
        let mut all_chunks = Vec::new();

        for file_path in files {
            match self.chunk_file(file_path, source) {
                Ok(chunks) => all_chunks.extend(chunks),
                Err(e) => log::error!("Error processing {file_path}: {e}"),
            }
        }

        log::info!(
            "Created {} chunks from {} files",
            all_chunks.len(),
            files.len()
        );
        all_chunks
    }

    /// Read and chunk a single file
    pub fn chunk_file(
        &self,
        file_path: &str,
        source: &dyn SourceProvider,
    ) -> Result<Vec<CodeChunk>> {
        let content = source
            .read_source(file_path)
            .map_err(|e| ChunkerError::read(file_path, e))?;
        Ok(self.chunk_str(&content, file_path))
    }

    /// Chunk the text of a single file
    pub fn chunk_str(&self, content: &str, file_path: &str) -> Vec<CodeChunk> {
        let lines: Vec<&str> = content.split('\n').collect();
        let metadata = FileMetadata {
            imports: self.analyzer.imports(content),
            enclosing_type: self.analyzer.enclosing_type(content),
        };

        self.windows(&lines)
            .into_iter()
            .map(|(start, end)| {
                CodeChunk::new(
                    file_path.to_string(),
                    lines[start..end].join("\n"),
                    start,
                    end,
                    metadata.clone(),
                )
            })
            .collect()
    }

    /// Compute `(start, end)` windows over the lines of one file
    fn windows(&self, lines: &[&str]) -> Vec<(usize, usize)> {
        let total = lines.len();
        let mut windows = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + self.config.window_size).min(total);
            if self.config.respect_boundaries {
                end = self.adjust_for_boundaries(lines, start, end);
            }

            if end - start < self.config.min_chunk_size && end < total {
                start += self.config.stride();
                continue;
            }

            windows.push((start, end));

            if end >= total {
                break;
            }

            // A boundary-shortened window may be no longer than the overlap;
            // the cursor must still move forward.
            let next = end.saturating_sub(self.config.overlap_size);
            start = if next > start { next } else { end };
        }

        windows
    }

    /// Pull a tentative window end back to the nearest preceding boundary
    fn adjust_for_boundaries(&self, lines: &[&str], start: usize, end: usize) -> usize {
        if end >= lines.len() {
            return end;
        }

        for i in (start + 1..end).rev() {
            let line = lines[i];

            if self.analyzer.closes_block(line) {
                return i + 1;
            }

            if line.trim().is_empty()
                && i + 1 < lines.len()
                && self.analyzer.starts_declaration(lines[i + 1])
            {
                return i + 1;
            }
        }

        end
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Get the analyzer used for file metadata
    #[must_use]
    pub fn analyzer(&self) -> &Arc<dyn SourceAnalyzer> {
        &self.analyzer
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn get_stats(chunks: &[CodeChunk]) -> ChunkingStats {
        let mut files: Vec<&str> = chunks.iter().map(|c| c.file_path.as_str()).collect();
        files.sort_unstable();
        files.dedup();

        let total_lines: usize = chunks.iter().map(CodeChunk::line_count).sum();

        ChunkingStats {
            total_chunks: chunks.len(),
            total_files: files.len(),
            total_lines,
            avg_lines_per_chunk: total_lines.checked_div(chunks.len()).unwrap_or(0),
            min_lines: chunks.iter().map(CodeChunk::line_count).min().unwrap_or(0),
            max_lines: chunks.iter().map(CodeChunk::line_count).max().unwrap_or(0),
        }
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_files: usize,
    pub total_lines: usize,
    pub avg_lines_per_chunk: usize,
    pub min_lines: usize,
    pub max_lines: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Files: {} | Lines: {} | Avg: {} | Range: {}-{}",
            self.total_chunks,
            self.total_files,
            self.total_lines,
            self.avg_lines_per_chunk,
            self.min_lines,
            self.max_lines
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use pretty_assertions::assert_eq;

    fn numbered(count: usize) -> String {
        (0..count)
            .map(|i| format!("int v{i} = {i};"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn ranges(chunks: &[CodeChunk]) -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start_line, c.end_line)).collect()
    }

    #[test]
    fn fixed_windows_overlap_by_configured_lines() {
        let chunker = Chunker::java(ChunkerConfig::fixed(10, 3)).unwrap();
        let chunks = chunker.chunk_str(&numbered(25), "A.java");

        assert_eq!(ranges(&chunks), vec![(0, 10), (7, 17), (14, 24), (21, 25)]);
        assert_eq!(chunks[1].content.lines().next(), Some("int v7 = 7;"));
    }

    #[test]
    fn short_file_emits_single_terminal_chunk() {
        let config = ChunkerConfig {
            window_size: 50,
            overlap_size: 5,
            min_chunk_size: 10,
            respect_boundaries: true,
        };
        let chunker = Chunker::java(config).unwrap();
        let chunks = chunker.chunk_str("class A {\n}", "A.java");

        assert_eq!(ranges(&chunks), vec![(0, 2)]);
        assert_eq!(chunks[0].content, "class A {\n}");
        assert_eq!(chunks[0].enclosing_type.as_deref(), Some("A"));
    }

    #[test]
    fn window_end_pulled_back_to_closing_brace() {
        let content = [
            "class A {",
            "  void a() {",
            "    x();",
            "  }",
            "  void b() {",
            "    y();",
            "    z();",
            "  }",
            "}",
        ]
        .join("\n");
        let config = ChunkerConfig {
            window_size: 6,
            overlap_size: 1,
            min_chunk_size: 2,
            respect_boundaries: true,
        };
        let chunker = Chunker::java(config).unwrap();
        let chunks = chunker.chunk_str(&content, "A.java");

        assert_eq!(chunks[0].start_line, 0);
        assert_eq!(chunks[0].end_line, 4);
        assert!(chunks[0].content.ends_with("  }"));
        assert_eq!(chunks.last().unwrap().end_line, 9);
    }

    #[test]
    fn window_end_pulled_back_to_declaration_after_blank_line() {
        let content = [
            "int a;",
            "int b;",
            "",
            "public int c;",
            "int d;",
            "int e;",
            "int f;",
        ]
        .join("\n");
        let config = ChunkerConfig {
            window_size: 5,
            overlap_size: 1,
            min_chunk_size: 1,
            respect_boundaries: true,
        };
        let chunker = Chunker::java(config).unwrap();
        let chunks = chunker.chunk_str(&content, "A.java");

        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[1].start_line, 2);
    }

    #[test]
    fn short_interior_windows_are_skipped() {
        let mut lines = vec!["a();", "}"];
        lines.extend(std::iter::repeat("b();").take(20));
        let content = lines.join("\n");
        let config = ChunkerConfig {
            window_size: 10,
            overlap_size: 2,
            min_chunk_size: 5,
            respect_boundaries: true,
        };
        let chunker = Chunker::java(config).unwrap();
        let chunks = chunker.chunk_str(&content, "A.java");

        // The first window shrinks to two lines and is skipped.
        assert_eq!(chunks[0].start_line, 8);
        let (terminal, interior) = chunks.split_last().unwrap();
        assert_eq!(terminal.end_line, 22);
        for chunk in interior {
            assert!(chunk.line_count() >= 5, "undersized chunk {chunk:?}");
        }
    }

    #[test]
    fn cursor_advances_when_window_is_shorter_than_overlap() {
        let content = ["a();", "b();", "}", "c();", "d();", "e();", "f();", "g();"].join("\n");
        let config = ChunkerConfig {
            window_size: 6,
            overlap_size: 5,
            min_chunk_size: 1,
            respect_boundaries: true,
        };
        let chunker = Chunker::java(config).unwrap();
        let chunks = chunker.chunk_str(&content, "A.java");

        assert_eq!(ranges(&chunks), vec![(0, 3), (3, 8)]);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let source = MemorySource::new()
            .with_file("a/A.java", "import b.B;\nclass A {\n}")
            .with_file("c/C.java", "class C {\n}");
        let files = vec![
            "a/A.java".to_string(),
            "missing/M.java".to_string(),
            "c/C.java".to_string(),
        ];
        let chunker = Chunker::java(ChunkerConfig::default()).unwrap();
        let chunks = chunker.chunk_files(&files, &source);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].file_path, "a/A.java");
        assert_eq!(chunks[0].imports, vec!["b.B".to_string()]);
        assert_eq!(chunks[1].file_path, "c/C.java");
        assert!(chunks[1].imports.is_empty());
    }

    #[test]
    fn unreadable_file_reports_path() {
        let chunker = Chunker::java(ChunkerConfig::default()).unwrap();
        let err = chunker
            .chunk_file("gone/G.java", &MemorySource::new())
            .unwrap_err();
        assert!(matches!(err, ChunkerError::Read { ref path, .. } if path == "gone/G.java"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Chunker::java(ChunkerConfig::fixed(5, 5)).is_err());
    }

    #[test]
    fn test_chunking_stats() {
        let chunker = Chunker::java(ChunkerConfig::fixed(10, 3)).unwrap();
        let chunks = chunker.chunk_str(&numbered(25), "A.java");
        let stats = Chunker::get_stats(&chunks);

        assert_eq!(stats.total_chunks, 4);
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.total_lines, 34);
        assert_eq!(stats.avg_lines_per_chunk, 8);
        assert_eq!(stats.min_lines, 4);
        assert_eq!(stats.max_lines, 10);

        let empty = Chunker::get_stats(&[]);
        assert_eq!((empty.total_lines, empty.avg_lines_per_chunk), (0, 0));
    }
}
