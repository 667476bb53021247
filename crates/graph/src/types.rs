use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A resolved call target: the method a chunk appears to call into
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// File that declares the target
    pub file_path: String,

    /// Type the call was resolved against
    pub class_name: String,

    /// Called method
    pub method_name: String,
}

impl Dependency {
    pub fn new(
        file_path: impl Into<String>,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.file_path, self.class_name, self.method_name
        )
    }
}

/// Heuristically discovered declarations of one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Declared method names
    pub methods: BTreeSet<String>,

    /// Declared type name -> 0-indexed declaration line
    pub types: BTreeMap<String, usize>,
}

impl FileEntry {
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    pub fn type_line(&self, name: &str) -> Option<usize> {
        self.types.get(name).copied()
    }
}

/// Outcome of scanning one chunk for dependencies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyScan {
    /// Number of `receiver.method(` call sites found
    pub call_sites: usize,

    /// Call sites that resolved, in order of appearance
    pub dependencies: Vec<Dependency>,
}

impl DependencyScan {
    pub fn unresolved(&self) -> usize {
        self.call_sites.saturating_sub(self.dependencies.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_display_is_composite_identity() {
        let dep = Dependency::new("src/B.java", "B", "g");
        assert_eq!(dep.to_string(), "src/B.java::B::g");
    }

    #[test]
    fn scan_counts_unresolved_calls() {
        let scan = DependencyScan {
            call_sites: 3,
            dependencies: vec![Dependency::new("B.java", "B", "g")],
        };
        assert_eq!(scan.unresolved(), 2);
    }
}
