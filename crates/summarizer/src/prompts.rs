//! Prompt templates for the four kinds of text-generation calls.

/// Summarize one chunk given the summaries of the methods it calls
pub fn chunk(language: &str, content: &str, context: &str) -> String {
    let fence = language.to_ascii_lowercase();
    format!(
        "Analyze this {language} code chunk with full understanding of its dependencies.

Code Chunk:
```{fence}
{content}
```

Dependency Context:
{context}

Using the dependency context above, create a comprehensive summary that explains:
1. What this code does and why (given the dependency behaviors)
2. How it integrates with the dependencies shown in context
3. The complete data flow and method interactions
4. Any patterns or logic that emerge from the dependency relationships

Write a detailed technical explanation that demonstrates deep understanding of how this code fits into the larger system."
    )
}

/// Short summary of a called method, used as dependency context
pub fn method(language: &str, content: &str, file_path: &str, method_name: &str) -> String {
    let fence = language.to_ascii_lowercase();
    format!(
        "Summarize this {language} method for dependency analysis.

Method: {method_name} in {file_path}

```{fence}
{content}
```

Provide a concise technical summary covering:
- Core functionality and purpose
- Key parameters and return behavior
- Side effects or state changes

Keep to 1-2 precise sentences for use as dependency context."
    )
}

/// File summary from its chunk summaries, already in line order
pub fn file(chunk_summaries: &[String], file_path: &str) -> String {
    let chunks_text = numbered(chunk_summaries, |i, summary| format!("Chunk {i}: {summary}"));
    format!(
        "Write a 3-4 sentence technical summary of this file's functionality.

File: {file_path}

Code Section Summaries:
{chunks_text}

Focus ONLY on what the code actually does:
1. What is the primary purpose of this file?
2. What are the key methods and what do they do?
3. What data does it manage and how?

Do NOT:
- Infer design patterns unless explicitly implemented
- Describe architectural decisions that aren't evident in the code
- Make recommendations for future improvements
- Speculate about potential integrations or system roles

Be specific. Be direct. Describe only what you can see in the code."
    )
}

/// Project summary from every published file summary
pub fn project(file_summaries: &[String], project_path: &str) -> String {
    let files_text = numbered(file_summaries, |i, summary| format!("File: {i}\n{summary}"));
    let total = file_summaries.len();
    format!(
        "Create a high-level project summary from these file summaries.

Project: {project_path}
Total Files: {total}

File Summaries:
{files_text}

Provide a project summary that includes:
- Overall project purpose and domain
- Main components and their interactions
- Key architectural patterns
- Primary functionality and features
- Notable design decisions

Focus on the big picture and overall system architecture."
    )
}

fn numbered(items: &[String], render: impl Fn(usize, &str) -> String) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| render(i + 1, item))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_prompt_numbers_chunks_in_order() {
        let prompt = file(&["reads".to_string(), "writes".to_string()], "src/A.java");
        assert!(prompt.contains("File: src/A.java"));
        assert!(prompt.contains("Chunk 1: reads\n\nChunk 2: writes"));
    }

    #[test]
    fn project_prompt_counts_files() {
        let prompt = project(&["one".to_string()], "/tmp/shop");
        assert!(prompt.contains("Total Files: 1"));
        assert!(prompt.contains("File: 1\none"));
    }

    #[test]
    fn code_is_fenced_with_language() {
        let prompt = chunk("Java", "int x;", "ctx");
        assert!(prompt.contains("```java\nint x;\n```"));
        assert!(prompt.contains("Dependency Context:\nctx"));
    }

    #[test]
    fn prompt_kinds_have_distinct_openings() {
        let openings: Vec<String> = [
            chunk("Java", "", ""),
            method("Java", "", "", ""),
            file(&[], ""),
            project(&[], ""),
        ]
        .iter()
        .map(|p| p.chars().take(10).collect())
        .collect();

        for (i, a) in openings.iter().enumerate() {
            for b in &openings[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
