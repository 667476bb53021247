use crate::error::{GraphError, Result};
use crate::types::FileEntry;
use codesum_chunker::{SourceAnalyzer, SourceProvider};
use std::collections::HashMap;
use std::path::Path;

/// Static map from file path to the methods and types it declares
///
/// Built once before any chunk is processed and never mutated afterwards, so
/// it can be shared freely between workers. The text of every readable file is
/// kept so that resolution never touches the disk again.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    /// Indexed paths in input order
    paths: Vec<String>,
    entries: HashMap<String, FileEntry>,
    sources: HashMap<String, String>,
}

impl ProjectIndex {
    /// Scan every file once. Unreadable files get an empty entry.
    pub fn build(
        files: &[String],
        source: &dyn SourceProvider,
        analyzer: &dyn SourceAnalyzer,
    ) -> Self {
        let mut index = Self::default();

        for path in files {
            match Self::index_file(path, source, analyzer) {
                Ok((entry, content)) => {
                    index.sources.insert(path.clone(), content);
                    index.insert(path.clone(), entry);
                }
                Err(e) => {
                    log::warn!("Indexing {path} failed, using empty entry: {e}");
                    index.insert(path.clone(), FileEntry::default());
                }
            }
        }

        log::info!(
            "Indexed {} files: {} methods, {} types",
            index.len(),
            index.entries.values().map(|e| e.methods.len()).sum::<usize>(),
            index.entries.values().map(|e| e.types.len()).sum::<usize>()
        );

        index
    }

    fn index_file(
        path: &str,
        source: &dyn SourceProvider,
        analyzer: &dyn SourceAnalyzer,
    ) -> Result<(FileEntry, String)> {
        let content = source
            .read_source(path)
            .map_err(|e| GraphError::source(path, e))?;

        let entry = FileEntry {
            methods: analyzer.method_names(&content).into_iter().collect(),
            types: analyzer
                .type_declarations(&content)
                .into_iter()
                .map(|decl| (decl.name, decl.line))
                .collect(),
        };
        Ok((entry, content))
    }

    fn insert(&mut self, path: String, entry: FileEntry) {
        if self.entries.insert(path.clone(), entry).is_none() {
            self.paths.push(path);
        }
    }

    /// Get the entry for a path
    pub fn entry(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    /// Text of an indexed file; `None` when it was unreadable or never indexed
    pub fn source(&self, path: &str) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }

    /// Whether the index records `method` as declared in `path`
    pub fn has_method(&self, path: &str, method: &str) -> bool {
        self.entry(path).is_some_and(|e| e.has_method(method))
    }

    /// Declaration line of `type_name` in `path`
    pub fn type_line(&self, path: &str, type_name: &str) -> Option<usize> {
        self.entry(path).and_then(|e| e.type_line(type_name))
    }

    /// Indexed paths whose file name is `{stem}.{extension}`, in input order
    pub fn files_named(&self, stem: &str, extension: &str) -> Vec<&str> {
        self.paths
            .iter()
            .map(String::as_str)
            .filter(|path| has_file_name(path, stem, extension))
            .collect()
    }

    /// Indexed path named `{stem}.{extension}` in the same directory as `sibling`
    pub fn sibling_named(&self, sibling: &str, stem: &str, extension: &str) -> Option<&str> {
        let dir = Path::new(sibling).parent();
        self.files_named(stem, extension)
            .into_iter()
            .find(|path| Path::new(path).parent() == dir)
    }

    /// Indexed paths in input order
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_file_name(path: &str, stem: &str, extension: &str) -> bool {
    let path = Path::new(path);
    path.file_stem().and_then(|s| s.to_str()) == Some(stem)
        && path.extension().and_then(|e| e.to_str()) == Some(extension)
}
