//! # Codesum Chunker
//!
//! Splits source files into overlapping windows of lines for summarization.
//!
//! ## Windowing
//!
//! ```text
//! Source file
//!     │
//!     ├──> File metadata (computed once, attached to every chunk)
//!     │      ├─> Imports
//!     │      └─> Enclosing type
//!     │
//!     └──> Windows of `window_size` lines
//!          ├─> End pulled back to a block / declaration boundary
//!          ├─> Short interior windows skipped
//!          └─> Next window starts `overlap_size` lines before the previous end
//! ```
//!
//! Source text is only ever inspected through [`SourceAnalyzer`], and files are
//! only ever read through [`SourceProvider`].
//!
//! ## Example
//!
//! ```rust
//! use codesum_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::java(ChunkerConfig::fixed(4, 1)).unwrap();
//! let code = "class Point {\n  int x;\n  int y;\n  int z;\n  int w;\n}";
//!
//! for chunk in chunker.chunk_str(code, "Point.java") {
//!     println!("lines {}..{}", chunk.start_line, chunk.end_line);
//! }
//! ```

mod analyzer;
mod chunker;
mod config;
mod error;
mod source;
mod types;

pub use analyzer::{CallSite, JavaHeuristics, SourceAnalyzer, TypeDeclaration};
pub use chunker::{Chunker, ChunkingStats};
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use source::{FsSource, MemorySource, SourceProvider};
pub use types::{CodeChunk, FileMetadata};
