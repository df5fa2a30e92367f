//! Normalized results of backend analysis commands.
//!
//! These are built by the connector's response mappers from untrusted
//! payloads; every field has an explicit default so consumers never deal
//! with missing data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How thoroughly the backend analyzes a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    Quick,
    #[default]
    Standard,
    Deep,
}

impl AnalysisDepth {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Standard => "standard",
            Self::Deep => "deep",
        }
    }
}

/// Line assigned to issues the backend reports without position information.
pub const DEFAULT_ISSUE_LINE: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SyntaxError,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A problem reported for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// 1-indexed line number.
    pub line: u32,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self {
            line: DEFAULT_ISSUE_LINE,
            kind: IssueKind::SyntaxError,
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: IssueKind::Warning,
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }
}

/// A structural element (function, class, ...) found in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeElement {
    pub name: String,
    /// Backend element type, e.g. `function` or `class`.
    pub kind: String,
    pub line: u32,
    pub complexity: u32,
    pub docstring: Option<String>,
    pub is_public: bool,
}

impl CodeElement {
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }

    #[must_use]
    pub fn has_docstring(&self) -> bool {
        self.docstring
            .as_deref()
            .is_some_and(|doc| !doc.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub lines_of_code: u64,
    pub average_complexity: f64,
    pub maintainability_index: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub file_path: String,
    pub language: String,
    pub elements: Vec<CodeElement>,
    pub issues: Vec<Issue>,
    pub metrics: FileMetrics,
    /// Locally derived recommendations, see the connector's suggestion rules.
    pub suggestions: Vec<String>,
}

impl FileAnalysis {
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::Error)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub average_complexity: f64,
    pub maintainability_index: f64,
    pub technical_debt_ratio: f64,
    pub test_coverage: Option<f64>,
}

/// Codebase overview merged from `analyze_codebase` and `get_code_metrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub project_path: String,
    pub total_files: u64,
    pub total_lines: u64,
    /// File count per language.
    pub languages: BTreeMap<String, u64>,
    pub metrics: ProjectMetrics,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCode {
    pub file_path: String,
    pub line: u32,
    /// Similarity score in `0.0..=1.0` as reported by the backend.
    pub similarity: f64,
    pub snippet: String,
}
