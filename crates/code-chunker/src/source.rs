use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Source-retrieval collaborator: maps a file path to its raw text
pub trait SourceProvider: Send + Sync {
    fn read_source(&self, path: &str) -> io::Result<String>;
}

/// Reads sources from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl SourceProvider for FsSource {
    fn read_source(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(Path::new(path))
    }
}

/// In-memory sources keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a file
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Paths of all stored files, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl SourceProvider for MemorySource {
    fn read_source(&self, path: &str) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such source: {path}"))
        })
    }
}
