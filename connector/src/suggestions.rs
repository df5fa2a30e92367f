//! Suggestion heuristics derived locally from analysis content.

use sage_types::{CodeElement, Suggestion};

/// Functions above this cyclomatic complexity are flagged for refactoring.
pub const COMPLEXITY_THRESHOLD: u32 = 10;

/// Derive recommendations from a file's elements.
///
/// Exactly two rules, each contributing at most one entry:
/// public functions without a docstring, and functions whose complexity
/// exceeds [`COMPLEXITY_THRESHOLD`].
#[must_use]
pub fn generate_suggestions(elements: &[CodeElement]) -> Vec<String> {
    let functions = || elements.iter().filter(|e| e.is_function());

    let undocumented = functions()
        .filter(|e| e.is_public && !e.has_docstring())
        .count();
    let complex = functions()
        .filter(|e| e.complexity > COMPLEXITY_THRESHOLD)
        .count();

    let mut suggestions = Vec::new();
    if undocumented > 0 {
        suggestions.push(format!(
            "Add docstrings to {undocumented} public functions"
        ));
    }
    if complex > 0 {
        suggestions.push(format!("Consider refactoring {complex} complex functions"));
    }
    suggestions
}

/// Turn free-text suggestions into categorized, prioritized records.
///
/// Ids are positional (`suggestion-1`, ...) and only stable within one
/// refresh.
#[must_use]
pub fn suggestions_from_text<S: AsRef<str>>(texts: &[S], file: Option<&str>) -> Vec<Suggestion> {
    texts
        .iter()
        .map(AsRef::as_ref)
        .filter(|text| !text.trim().is_empty())
        .enumerate()
        .map(|(idx, text)| Suggestion::from_text(format!("suggestion-{}", idx + 1), text, file))
        .collect()
}
