//! Response mappers: normalize untrusted backend payloads into typed results.
//!
//! Payload shape is never trusted: every field is read through a typed
//! accessor with an explicit default, list entries of the wrong type are
//! skipped individually, and nothing here can fail.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use sage_types::{
    CodeElement, CommitGeneration, ConventionalCommit, DEFAULT_ISSUE_LINE, FileAnalysis,
    FileMetrics, Issue, ProjectAnalysis, ProjectMetrics, SimilarCode,
};
use serde_json::{Map, Value};

use crate::suggestions::generate_suggestions;

static WARNING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"line (\d+)").expect("valid warning line regex"));

const DEFAULT_COMMIT_TYPE: &str = "chore";

type Object = Map<String, Value>;

fn str_field<'a>(obj: &'a Object, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn string_field(obj: &Object, key: &str) -> String {
    str_field(obj, key).unwrap_or_default().to_string()
}

fn non_blank_field(obj: &Object, key: &str) -> Option<String> {
    str_field(obj, key)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn f64_field(obj: &Object, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn u64_field(obj: &Object, key: &str) -> Option<u64> {
    let value = obj.get(key)?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
}

fn u32_field(obj: &Object, key: &str) -> Option<u32> {
    u64_field(obj, key).map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn bool_field(obj: &Object, key: &str) -> Option<bool> {
    obj.get(key).and_then(Value::as_bool)
}

fn object_field<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    obj.get(key).and_then(Value::as_object)
}

fn objects<'a>(obj: &'a Object, key: &str) -> impl Iterator<Item = &'a Object> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn strings(obj: &Object, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Merge backend `errors` and `warnings` into one issue list.
///
/// Errors carry no position and land on line 1; warnings recover their line
/// from a `line N` mention when present.
#[must_use]
pub fn map_issues<E, W>(errors: &[E], warnings: &[W]) -> Vec<Issue>
where
    E: AsRef<str>,
    W: AsRef<str>,
{
    let errors = errors.iter().map(|text| Issue::syntax_error(text.as_ref()));
    let warnings = warnings.iter().map(|text| {
        let text = text.as_ref();
        Issue::warning(warning_line(text).unwrap_or(DEFAULT_ISSUE_LINE), text)
    });
    errors.chain(warnings).collect()
}

fn warning_line(text: &str) -> Option<u32> {
    WARNING_LINE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn map_element(raw: &Object) -> Option<CodeElement> {
    let name = str_field(raw, "name")?.to_string();
    let is_public = bool_field(raw, "is_public").unwrap_or_else(|| !name.starts_with('_'));
    Some(CodeElement {
        kind: str_field(raw, "type")
            .or_else(|| str_field(raw, "kind"))
            .unwrap_or("unknown")
            .to_string(),
        line: u32_field(raw, "line").unwrap_or(DEFAULT_ISSUE_LINE),
        complexity: u32_field(raw, "complexity").unwrap_or(0),
        docstring: non_blank_field(raw, "docstring"),
        is_public,
        name,
    })
}

/// Map an `analyze_file` payload. Suggestions are derived locally from the
/// elements; the backend never supplies them.
#[must_use]
pub fn map_file_analysis(file_path: &str, payload: &Object) -> FileAnalysis {
    let elements: Vec<CodeElement> = objects(payload, "elements").filter_map(map_element).collect();
    let issues = map_issues(&strings(payload, "errors"), &strings(payload, "warnings"));
    let metrics = object_field(payload, "metrics")
        .map(|m| FileMetrics {
            lines_of_code: u64_field(m, "lines_of_code").unwrap_or(0),
            average_complexity: f64_field(m, "average_complexity").unwrap_or(0.0),
            maintainability_index: f64_field(m, "maintainability_index").unwrap_or(0.0),
        })
        .unwrap_or_default();
    let suggestions = generate_suggestions(&elements);

    FileAnalysis {
        file_path: str_field(payload, "file_path")
            .unwrap_or(file_path)
            .to_string(),
        language: str_field(payload, "language")
            .unwrap_or("unknown")
            .to_string(),
        elements,
        issues,
        metrics,
        suggestions,
    }
}

/// Merge the `analyze_codebase` and `get_code_metrics` payloads.
///
/// Metrics may arrive nested under `metrics` or at the payload top level.
#[must_use]
pub fn map_project_analysis(
    project_path: &str,
    codebase: &Object,
    metrics_payload: &Object,
) -> ProjectAnalysis {
    let metrics = object_field(metrics_payload, "metrics").unwrap_or(metrics_payload);
    let languages: BTreeMap<String, u64> = object_field(codebase, "languages")
        .into_iter()
        .flatten()
        .filter_map(|(lang, count)| {
            let count = count.as_u64().or_else(|| count.as_f64().map(|f| f as u64))?;
            Some((lang.clone(), count))
        })
        .collect();

    ProjectAnalysis {
        project_path: str_field(codebase, "project_path")
            .unwrap_or(project_path)
            .to_string(),
        total_files: u64_field(codebase, "total_files").unwrap_or(0),
        total_lines: u64_field(codebase, "total_lines").unwrap_or(0),
        languages,
        metrics: ProjectMetrics {
            average_complexity: f64_field(metrics, "average_complexity").unwrap_or(0.0),
            maintainability_index: f64_field(metrics, "maintainability_index").unwrap_or(0.0),
            technical_debt_ratio: f64_field(metrics, "technical_debt_ratio").unwrap_or(0.0),
            test_coverage: f64_field(metrics, "test_coverage"),
        },
        recommendations: strings(codebase, "recommendations"),
    }
}

/// Map a `generate_commit` payload; the parts may be nested under `commit`.
/// The message is always formatted locally from the parts.
#[must_use]
pub fn map_commit_generation(payload: &Object) -> CommitGeneration {
    let parts = object_field(payload, "commit").unwrap_or(payload);
    let commit = ConventionalCommit {
        commit_type: non_blank_field(parts, "type")
            .unwrap_or_else(|| DEFAULT_COMMIT_TYPE.to_string()),
        scope: non_blank_field(parts, "scope"),
        breaking_change: bool_field(parts, "breaking_change").unwrap_or(false),
        description: string_field(parts, "description"),
        body: non_blank_field(parts, "body"),
        footer: non_blank_field(parts, "footer"),
    };
    let confidence = f64_field(payload, "confidence")
        .or_else(|| f64_field(parts, "confidence"))
        .unwrap_or(0.0);
    let files_changed = if payload.contains_key("files_changed") {
        strings(payload, "files_changed")
    } else {
        strings(parts, "files_changed")
    };
    CommitGeneration::new(commit, confidence, files_changed)
}

/// Map a `find_similar_code` payload (`similar_code`, or `results`).
#[must_use]
pub fn map_similar_code(payload: &Object) -> Vec<SimilarCode> {
    let key = if payload.contains_key("similar_code") {
        "similar_code"
    } else {
        "results"
    };
    objects(payload, key)
        .filter_map(|raw| {
            let file_path = str_field(raw, "file_path")?.to_string();
            Some(SimilarCode {
                file_path,
                line: u32_field(raw, "line").unwrap_or(DEFAULT_ISSUE_LINE),
                similarity: f64_field(raw, "similarity").unwrap_or(0.0),
                snippet: str_field(raw, "snippet")
                    .or_else(|| str_field(raw, "code"))
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

/// Map a `get_status` payload: the nested `status` object when present,
/// otherwise the payload minus the envelope bookkeeping keys.
#[must_use]
pub fn map_system_status(payload: &Object) -> Object {
    if let Some(status) = object_field(payload, "status") {
        return status.clone();
    }
    payload
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "success" | "command"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// `content` of a `generate` payload, falling back to `response`.
#[must_use]
pub fn map_generated_content(payload: &Object) -> Option<String> {
    str_field(payload, "content")
        .or_else(|| str_field(payload, "response"))
        .map(str::to_string)
}
