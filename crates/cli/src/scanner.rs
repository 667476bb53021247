use crate::config::ProjectConfig;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// Finds the files of a project that should be summarized
pub struct ProjectScanner {
    root: PathBuf,
    extensions: Vec<String>,
    exclude: GlobSet,
    include_tests: bool,
}

impl ProjectScanner {
    pub fn new(root: impl AsRef<Path>, config: &ProjectConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob =
                Glob::new(pattern).with_context(|| format!("Invalid exclude pattern '{pattern}'"))?;
            builder.add(glob);
        }

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude: builder.build().context("Failed to build exclude patterns")?,
            include_tests: config.include_tests,
        })
    }

    /// Matching files, sorted (.gitignore aware, hidden files skipped)
    pub fn scan(&self) -> Vec<String> {
        let mut files = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);

        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            if !self.has_source_extension(path) {
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            if self.exclude.is_match(relative) {
                log::debug!("Excluded {}", relative.display());
                continue;
            }
            if !self.include_tests && is_test_file(relative) {
                log::debug!("Skipping test file {}", relative.display());
                continue;
            }

            files.push(path.to_string_lossy().into_owned());
        }

        files.sort();
        log::info!("Found {} source files", files.len());
        files
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|candidate| *candidate == ext)
            })
    }
}

/// File name mentions `test`, or some directory is called `test`
fn is_test_file(relative: &Path) -> bool {
    let name_mentions_test = relative
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.to_ascii_lowercase().contains("test"));

    name_mentions_test
        || relative.components().any(|component| {
            matches!(component, Component::Normal(name) if name.eq_ignore_ascii_case("test"))
        })
}
