use crate::error::{GraphError, Result};
use crate::index::ProjectIndex;
use crate::types::{Dependency, DependencyScan};
use codesum_chunker::{CallSite, CodeChunk, SourceAnalyzer, SourceProvider};
use std::sync::Arc;

/// Resolves `receiver.method(` call sites to candidate source locations
///
/// Resolution order for each call site, first success wins:
/// 1. a type declared in the chunk's own file whose body calls the method
/// 2. an import whose last component names the receiver, if the imported
///    file declares the method
/// 3. a file named after the receiver in the chunk's directory, if it
///    declares the method
///
/// Receivers are matched both as written and with the first letter upper-cased,
/// so a variable `cart` also matches the type `Cart`.
///
/// Works on the text captured by the [`ProjectIndex`] only; nothing is read
/// from the source provider after construction.
pub struct DependencyResolver {
    index: ProjectIndex,
    analyzer: Arc<dyn SourceAnalyzer>,
}

impl DependencyResolver {
    pub fn new(index: ProjectIndex, analyzer: Arc<dyn SourceAnalyzer>) -> Self {
        Self { index, analyzer }
    }

    /// Build the project index and wrap it in a resolver
    pub fn build(
        files: &[String],
        source: &dyn SourceProvider,
        analyzer: Arc<dyn SourceAnalyzer>,
    ) -> Self {
        let index = ProjectIndex::build(files, source, analyzer.as_ref());
        Self::new(index, analyzer)
    }

    pub fn index(&self) -> &ProjectIndex {
        &self.index
    }

    pub fn analyzer(&self) -> &Arc<dyn SourceAnalyzer> {
        &self.analyzer
    }

    /// Resolve every call site in the chunk; unresolved calls are dropped
    pub fn find_dependencies(&self, chunk: &CodeChunk) -> DependencyScan {
        let calls = self.analyzer.call_sites(&chunk.content);
        let dependencies: Vec<Dependency> = calls
            .iter()
            .filter_map(|call| self.resolve(call, chunk))
            .collect();

        log::debug!(
            "{}:{}-{}: {} call sites, {} resolved",
            chunk.file_path,
            chunk.start_line,
            chunk.end_line,
            calls.len(),
            dependencies.len()
        );

        DependencyScan {
            call_sites: calls.len(),
            dependencies,
        }
    }

    /// Resolve one call site found in `chunk`
    pub fn resolve(&self, call: &CallSite, chunk: &CodeChunk) -> Option<Dependency> {
        let candidates = receiver_type_names(&call.receiver);

        self.resolve_same_file(&candidates, &call.method, chunk)
            .or_else(|| self.resolve_import(&candidates, &call.method, chunk))
            .or_else(|| self.resolve_same_package(&candidates, &call.method, chunk))
    }

    fn resolve_same_file(
        &self,
        candidates: &[String],
        method: &str,
        chunk: &CodeChunk,
    ) -> Option<Dependency> {
        candidates.iter().find_map(|type_name| {
            let line = self.index.type_line(&chunk.file_path, type_name)?;
            self.type_body_calls(&chunk.file_path, line, method)
                .then(|| Dependency::new(&chunk.file_path, type_name, method))
        })
    }

    fn resolve_import(
        &self,
        candidates: &[String],
        method: &str,
        chunk: &CodeChunk,
    ) -> Option<Dependency> {
        let extension = self.analyzer.source_extension();

        chunk.imports.iter().find_map(|import| {
            let imported = import.rsplit('.').next()?;
            if !candidates.iter().any(|c| c == imported) {
                return None;
            }

            let target = self.file_for_import(import, imported, extension)?;
            self.index
                .has_method(target, method)
                .then(|| Dependency::new(target, imported, method))
        })
    }

    fn resolve_same_package(
        &self,
        candidates: &[String],
        method: &str,
        chunk: &CodeChunk,
    ) -> Option<Dependency> {
        let extension = self.analyzer.source_extension();

        candidates.iter().find_map(|type_name| {
            let target = self
                .index
                .sibling_named(&chunk.file_path, type_name, extension)?;
            self.index
                .has_method(target, method)
                .then(|| Dependency::new(target, type_name, method))
        })
    }

    /// File declaring an imported type; a path that mirrors the import's
    /// package wins over any other file with the same name.
    fn file_for_import(&self, import: &str, type_name: &str, extension: &str) -> Option<&str> {
        let package_path = format!("{}.{extension}", import.replace('.', "/"));
        let named = self.index.files_named(type_name, extension);
        let first = *named.first()?;

        Some(
            named
                .into_iter()
                .find(|path| path.replace('\\', "/").ends_with(&package_path))
                .unwrap_or(first),
        )
    }

    /// Whether the body of the type declared at `decl_line` mentions `method(`
    fn type_body_calls(&self, path: &str, decl_line: usize, method: &str) -> bool {
        let Some(content) = self.index.source(path) else {
            log::debug!("Cannot scan type body in {path}: not indexed");
            return false;
        };
        let Some(pattern) = self.analyzer.call_pattern(method) else {
            return false;
        };

        let mut depth: isize = 0;
        for (i, line) in content.split('\n').enumerate().skip(decl_line) {
            depth += self.analyzer.depth_delta(line);

            if pattern.is_match(line) {
                return true;
            }

            if depth <= 0 && i > decl_line {
                break;
            }
        }

        false
    }

    /// Source text of a resolved method
    ///
    /// Starts at the first line mentioning `method_name(` and stops once brace
    /// depth is back to zero or below. A first line that opens and closes its
    /// own block stands alone; otherwise the check applies from the second line
    /// on, so a brace-less declaration yields itself plus one line.
    ///
    /// Returns a placeholder comment when the file cannot be read and an empty
    /// string when no line mentions the method.
    pub fn extract_method(&self, file_path: &str, method_name: &str) -> String {
        match self.read_method(file_path, method_name) {
            Ok(text) => text,
            Err(GraphError::MethodNotFound { .. }) => String::new(),
            Err(e) => {
                log::warn!("{e}");
                format!("// Could not extract method {method_name} from {file_path}")
            }
        }
    }

    fn read_method(&self, file_path: &str, method_name: &str) -> Result<String> {
        let content = self
            .index
            .source(file_path)
            .ok_or_else(|| GraphError::NotIndexed {
                path: file_path.to_string(),
            })?;
        let not_found = || GraphError::MethodNotFound {
            path: file_path.to_string(),
            method: method_name.to_string(),
        };
        let pattern = self.analyzer.call_pattern(method_name).ok_or_else(not_found)?;

        let mut lines = content.split('\n');
        let first = lines
            .by_ref()
            .find(|line| pattern.is_match(line))
            .ok_or_else(not_found)?;

        let mut method_lines = vec![first];
        let mut depth = self.analyzer.depth_delta(first);

        if !(first.contains('{') && depth <= 0) {
            for line in lines {
                method_lines.push(line);
                depth += self.analyzer.depth_delta(line);
                if depth <= 0 {
                    break;
                }
            }
        }

        Ok(method_lines.join("\n"))
    }
}

/// Type names a receiver may refer to: as written, then capitalized
fn receiver_type_names(receiver: &str) -> Vec<String> {
    let mut names = vec![receiver.to_string()];
    let mut chars = receiver.chars();
    if let Some(first) = chars.next() {
        if first.is_lowercase() {
            names.push(first.to_uppercase().chain(chars).collect());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesum_chunker::{Chunker, ChunkerConfig, JavaHeuristics, MemorySource};
    use pretty_assertions::assert_eq;

    fn resolver(source: MemorySource) -> DependencyResolver {
        let files = source.paths();
        DependencyResolver::build(&files, &source, Arc::new(JavaHeuristics))
    }

    fn chunk_of(source: &MemorySource, path: &str) -> CodeChunk {
        let content = source.read_source(path).unwrap();
        let chunker = Chunker::java(ChunkerConfig::fixed(500, 0)).unwrap();
        chunker.chunk_str(&content, path).remove(0)
    }

    #[test]
    fn resolves_imported_type_through_variable_receiver() {
        let source = MemorySource::new()
            .with_file("a/A.java", "import b.B;\nclass A { void f(){ b.g(); } }")
            .with_file("b/B.java", "class B { void g(){} }");
        let chunk = chunk_of(&source, "a/A.java");
        let resolver = resolver(source);

        let scan = resolver.find_dependencies(&chunk);
        assert_eq!(scan.call_sites, 1);
        assert_eq!(scan.dependencies, vec![Dependency::new("b/B.java", "B", "g")]);
    }

    #[test]
    fn same_file_type_wins_over_import() {
        let source = MemorySource::new()
            .with_file(
                "app/Main.java",
                "import lib.Helper;\npublic class Main {\n    void run() {\n        Helper.assist();\n    }\n}\nclass Helper {\n    void go() {\n        assist();\n    }\n}\n",
            )
            .with_file("lib/Helper.java", "public class Helper {\n    public void assist() {\n    }\n}\n");
        let chunk = chunk_of(&source, "app/Main.java");
        let resolver = resolver(source);

        let dep = resolver
            .resolve(&CallSite::new("Helper", "assist"), &chunk)
            .unwrap();
        assert_eq!(dep, Dependency::new("app/Main.java", "Helper", "assist"));
    }

    #[test]
    fn same_file_type_body_is_bounded_by_braces() {
        let source = MemorySource::new()
            .with_file(
                "app/Main.java",
                "class Main {\n    void run() {\n        Box.open();\n    }\n}\nclass Box {\n    void close() {\n    }\n}\nclass Other {\n    void x() { open(); }\n}\n",
            );
        let chunk = chunk_of(&source, "app/Main.java");
        let resolver = resolver(source);

        assert_eq!(resolver.resolve(&CallSite::new("Box", "open"), &chunk), None);
    }

    #[test]
    fn falls_back_to_same_package_file() {
        let source = MemorySource::new()
            .with_file("pkg/Main.java", "class Main {\n    void run() {\n        repo.save();\n    }\n}\n")
            .with_file("pkg/Repo.java", "public class Repo {\n    public void save() {\n    }\n}\n")
            .with_file("other/Repo.java", "public class Repo {\n    public void save() {\n    }\n}\n");
        let chunk = chunk_of(&source, "pkg/Main.java");
        let resolver = resolver(source);

        let scan = resolver.find_dependencies(&chunk);
        assert_eq!(scan.dependencies, vec![Dependency::new("pkg/Repo.java", "Repo", "save")]);
    }

    #[test]
    fn import_prefers_file_matching_package_path() {
        let source = MemorySource::new()
            .with_file("src/a/Repo.java", "class Repo {\n    void save() {\n    }\n}\n")
            .with_file("src/com/acme/Repo.java", "class Repo {\n    void save() {\n    }\n}\n")
            .with_file("src/app/Main.java", "import com.acme.Repo;\nclass Main {\n    void run() { Repo.save(); }\n}\n");
        let chunk = chunk_of(&source, "src/app/Main.java");
        let resolver = resolver(source);

        let dep = resolver.resolve(&CallSite::new("Repo", "save"), &chunk).unwrap();
        assert_eq!(dep.file_path, "src/com/acme/Repo.java");
    }

    #[test]
    fn unknown_method_or_receiver_is_unresolved() {
        let source = MemorySource::new()
            .with_file("a/A.java", "import b.B;\nclass A { void f(){ b.missing(); list.add(1); } }")
            .with_file("b/B.java", "class B { void g(){} }");
        let chunk = chunk_of(&source, "a/A.java");
        let resolver = resolver(source);

        let scan = resolver.find_dependencies(&chunk);
        assert_eq!(scan.call_sites, 2);
        assert!(scan.dependencies.is_empty());
        assert_eq!(scan.unresolved(), 2);
    }

    #[test]
    fn extracts_method_body_by_brace_depth() {
        let source = MemorySource::new().with_file(
            "b/B.java",
            "class B {\n    int g(int x) {\n        if (x > 0) {\n            return x;\n        }\n        return 0;\n    }\n\n    void h() {}\n}\n",
        );
        let resolver = resolver(source);

        assert_eq!(
            resolver.extract_method("b/B.java", "g"),
            "    int g(int x) {\n        if (x > 0) {\n            return x;\n        }\n        return 0;\n    }"
        );
        assert_eq!(resolver.extract_method("b/B.java", "h"), "    void h() {}");
        assert_eq!(resolver.extract_method("b/B.java", "nope"), "");
    }

    #[test]
    fn declaration_without_braces_stops_after_next_line() {
        let source = MemorySource::new().with_file(
            "r/Repo.java",
            "interface Repo {\n    void save(Item item);\n    void load();\n    void drop();\n}\n// trailer\nclass Other {\n    void x() {\n    }\n}\n",
        );
        let resolver = resolver(source);

        let text = resolver.extract_method("r/Repo.java", "save");
        assert_eq!(text, "    void save(Item item);\n    void load();");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn first_mention_as_call_line_does_not_run_to_end_of_file() {
        let source = MemorySource::new().with_file(
            "app/Main.java",
            "class Main {\n    void run() {\n        helper.assist();\n    }\n    void assist() {\n        work();\n    }\n}\n",
        );
        let resolver = resolver(source);

        assert_eq!(
            resolver.extract_method("app/Main.java", "assist"),
            "        helper.assist();\n    }"
        );
    }

    #[test]
    fn resolution_uses_indexed_text_only() {
        let mut source = MemorySource::new()
            .with_file("b/B.java", "class B {\n    void g() {\n        return;\n    }\n}\n");
        let resolver = DependencyResolver::build(&source.paths(), &source, Arc::new(JavaHeuristics));
        source.insert("b/B.java", "class B {}\n");

        assert_eq!(
            resolver.extract_method("b/B.java", "g"),
            "    void g() {\n        return;\n    }"
        );
    }

    #[test]
    fn extract_method_from_unreadable_file_returns_placeholder() {
        let resolver = resolver(MemorySource::new());
        assert_eq!(
            resolver.extract_method("gone/G.java", "run"),
            "// Could not extract method run from gone/G.java"
        );
    }

    #[test]
    fn receiver_names_include_capitalized_form() {
        assert_eq!(receiver_type_names("cart"), vec!["cart", "Cart"]);
        assert_eq!(receiver_type_names("Cart"), vec!["Cart"]);
    }
}
