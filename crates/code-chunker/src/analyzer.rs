//! Line-oriented source heuristics.
//!
//! Everything the pipeline needs to know about source text (imports, type and
//! method declarations, call sites, block boundaries) goes through
//! [`SourceAnalyzer`]. The bundled [`JavaHeuristics`] is pattern based and
//! accepts false positives and negatives; a syntax-aware analyzer can replace
//! it without touching chunking, resolution or summarization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A `receiver.method(` occurrence found in source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub receiver: String,
    pub method: String,
}

impl CallSite {
    pub fn new(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            method: method.into(),
        }
    }
}

/// A type declaration and the 0-indexed line it starts on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    pub line: usize,
}

/// Narrow extraction interface used by the chunker, the project index and the resolver
pub trait SourceAnalyzer: Send + Sync {
    /// Language name shown in prompts
    fn language_name(&self) -> &str;

    /// Extension (without the dot) of files this analyzer understands
    fn source_extension(&self) -> &str;

    /// Imported names in declaration order
    fn imports(&self, content: &str) -> Vec<String>;

    /// Name of the first type declared in the file
    fn enclosing_type(&self, content: &str) -> Option<String>;

    /// Names of declared methods, in order of appearance
    fn method_names(&self, content: &str) -> Vec<String>;

    /// Declared types with their declaration lines
    fn type_declarations(&self, content: &str) -> Vec<TypeDeclaration>;

    /// All `receiver.method(` occurrences, in order of appearance
    fn call_sites(&self, content: &str) -> Vec<CallSite>;

    /// Pattern matching `method(` as a whole word; compile once, match per line
    fn call_pattern(&self, method: &str) -> Option<Regex>;

    /// Net change in block nesting depth contributed by `line`
    fn depth_delta(&self, line: &str) -> isize;

    /// Whether `line` closes a block (and is not a line comment)
    fn closes_block(&self, line: &str) -> bool;

    /// Whether `line` opens a new declaration (visibility, type or annotation)
    fn starts_declaration(&self, line: &str) -> bool;
}

static IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*import\s+([^;]+);").expect("valid import regex"));

static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|abstract|final|sealed)\s+)*(?:class|interface|enum|record)\s+(\w+)",
    )
    .expect("valid type regex")
});

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:public|private|protected|static|\s)+[\w<>\[\]]+\s+(\w+)\s*\([^)]*\)\s*\{")
        .expect("valid method regex")
});

static CALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\.(\w+)\s*\(").expect("valid call regex"));

const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "catch", "switch"];

const DECLARATION_PREFIXES: &[&str] = &[
    "public ",
    "private ",
    "protected ",
    "class ",
    "interface ",
    "enum ",
    "@",
];

/// Pattern-based analyzer for Java-like brace languages
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaHeuristics;

impl JavaHeuristics {
    pub const fn new() -> Self {
        Self
    }
}

impl SourceAnalyzer for JavaHeuristics {
    fn language_name(&self) -> &str {
        "Java"
    }

    fn source_extension(&self) -> &str {
        "java"
    }

    fn imports(&self, content: &str) -> Vec<String> {
        content
            .split('\n')
            .filter_map(|line| IMPORT_RE.captures(line))
            .map(|caps| caps[1].trim().to_string())
            .collect()
    }

    fn enclosing_type(&self, content: &str) -> Option<String> {
        content
            .split('\n')
            .find_map(|line| TYPE_RE.captures(line).map(|caps| caps[1].to_string()))
    }

    fn method_names(&self, content: &str) -> Vec<String> {
        METHOD_RE
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .filter(|name| !CONTROL_KEYWORDS.contains(&name.as_str()))
            .collect()
    }

    fn type_declarations(&self, content: &str) -> Vec<TypeDeclaration> {
        content
            .split('\n')
            .enumerate()
            .filter_map(|(line, text)| {
                TYPE_RE.captures(text).map(|caps| TypeDeclaration {
                    name: caps[1].to_string(),
                    line,
                })
            })
            .collect()
    }

    fn call_sites(&self, content: &str) -> Vec<CallSite> {
        CALL_RE
            .captures_iter(content)
            .map(|caps| CallSite::new(&caps[1], &caps[2]))
            .collect()
    }

    fn call_pattern(&self, method: &str) -> Option<Regex> {
        Regex::new(&format!(r"\b{}\s*\(", regex::escape(method))).ok()
    }

    fn depth_delta(&self, line: &str) -> isize {
        let opens = line.matches('{').count();
        let closes = line.matches('}').count();
        opens as isize - closes as isize
    }

    fn closes_block(&self, line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.ends_with('}') && !trimmed.starts_with("//")
    }

    fn starts_declaration(&self, line: &str) -> bool {
        let trimmed = line.trim();
        DECLARATION_PREFIXES
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
    }
}
