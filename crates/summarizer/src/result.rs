use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Output artifact of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub project_summary: String,

    /// File path -> file summary, ordered by path
    pub file_summaries: BTreeMap<String, String>,

    /// Number of input files, including ones that produced no chunks
    pub total_files: usize,

    pub total_chunks: usize,
    pub project_path: String,
}

impl ProjectResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the artifact as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_artifact_field_names() {
        let result = ProjectResult {
            project_summary: "shop".to_string(),
            file_summaries: BTreeMap::from([("B.java".to_string(), "b".to_string())]),
            total_files: 2,
            total_chunks: 3,
            project_path: "/src/shop".to_string(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "project_summary": "shop",
                "file_summaries": {"B.java": "b"},
                "total_files": 2,
                "total_chunks": 3,
                "project_path": "/src/shop"
            })
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("summary_shop.json");
        result.write_json(&path).unwrap();
        let back: ProjectResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, result);
    }
}
